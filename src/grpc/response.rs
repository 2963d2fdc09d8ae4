//! Response builders for both callout protocols.
//!
//! Allow always sets the identity header with replace semantics; deny always
//! answers 403 with a `denied: <reason>` body.

use tonic::Code;

use crate::error::AuthError;
use crate::headers::IDENTITY_HEADER;
use crate::proto::envoy::config::core::v3::{HeaderValue, HeaderValueOption};
use crate::proto::envoy::r#type::v3::{HttpStatus, StatusCode};
use crate::proto::envoy::service::auth::v3::{
    CheckResponse, DeniedHttpResponse, OkHttpResponse, check_response,
};
use crate::proto::envoy::service::ext_proc::v3::{
    BodyResponse, CommonResponse, HeaderMutation, HeadersResponse, ImmediateResponse,
    ProcessingResponse, TrailersResponse, common_response, processing_response,
};
use crate::proto::google::rpc::Status as RpcStatus;

/// `x-uid: <subject>`, replacing any value already on the request.
pub fn identity_header(subject: &str) -> HeaderValueOption {
    HeaderValueOption {
        header: Some(HeaderValue {
            key: IDENTITY_HEADER.to_string(),
            value: subject.to_string(),
            raw_value: subject.as_bytes().to_vec(),
        }),
        append: Some(false),
        ..Default::default()
    }
}

fn forbidden() -> Option<HttpStatus> {
    Some(HttpStatus {
        code: StatusCode::Forbidden as i32,
    })
}

// ============================================================================
// ext_authz Check
// ============================================================================

/// OK status with an instruction to set the identity header.
pub fn check_allowed(subject: &str) -> CheckResponse {
    CheckResponse {
        status: Some(RpcStatus {
            code: Code::Ok as i32,
            ..Default::default()
        }),
        http_response: Some(check_response::HttpResponse::OkResponse(OkHttpResponse {
            headers: vec![identity_header(subject)],
            ..Default::default()
        })),
    }
}

/// PERMISSION_DENIED status carrying the reason, plus a 403 for the client.
pub fn check_denied(reason: &AuthError) -> CheckResponse {
    CheckResponse {
        status: Some(RpcStatus {
            code: Code::PermissionDenied as i32,
            message: reason.to_string(),
            details: Vec::new(),
        }),
        http_response: Some(check_response::HttpResponse::DeniedResponse(
            DeniedHttpResponse {
                status: forbidden(),
                headers: Vec::new(),
                body: reason.denial_body(),
            },
        )),
    }
}

// ============================================================================
// ext_proc Process
// ============================================================================

fn continue_response(header_mutation: Option<HeaderMutation>) -> Option<CommonResponse> {
    Some(CommonResponse {
        status: common_response::ResponseStatus::Continue as i32,
        header_mutation,
        ..Default::default()
    })
}

/// Plain `CONTINUE` for a headers event.
pub fn continue_headers() -> HeadersResponse {
    HeadersResponse {
        response: continue_response(None),
    }
}

/// Plain `CONTINUE` for a body event.
pub fn continue_body() -> BodyResponse {
    BodyResponse {
        response: continue_response(None),
    }
}

/// Empty acknowledgement for a trailers event.
pub fn empty_trailers() -> TrailersResponse {
    TrailersResponse::default()
}

/// `CONTINUE` on request headers with the identity header set.
pub fn request_headers_allowed(subject: &str) -> ProcessingResponse {
    let mutation = HeaderMutation {
        set_headers: vec![identity_header(subject)],
        remove_headers: Vec::new(),
    };

    ProcessingResponse {
        response: Some(processing_response::Response::RequestHeaders(
            HeadersResponse {
                response: continue_response(Some(mutation)),
            },
        )),
    }
}

/// Terminal 403 that ends the exchange in place of the per-event response.
pub fn immediate_denied(reason: &AuthError) -> ProcessingResponse {
    ProcessingResponse {
        response: Some(processing_response::Response::ImmediateResponse(
            ImmediateResponse {
                status: forbidden(),
                body: reason.denial_body().into_bytes(),
                ..Default::default()
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_header_replaces() {
        let option = identity_header("alice");
        assert_eq!(option.append, Some(false));
        let header = option.header.unwrap();
        assert_eq!(header.key, "x-uid");
        assert_eq!(header.value, "alice");
        assert_eq!(header.raw_value, b"alice");
    }

    #[test]
    fn test_check_denied_shape() {
        let response = check_denied(&AuthError::AuthorizationMissing);
        let status = response.status.unwrap();
        assert_eq!(status.code, Code::PermissionDenied as i32);
        assert_eq!(status.message, "authorization header is missing");

        match response.http_response {
            Some(check_response::HttpResponse::DeniedResponse(denied)) => {
                assert_eq!(denied.status.unwrap().code, StatusCode::Forbidden as i32);
                assert_eq!(denied.body, "denied: authorization header is missing");
            }
            other => panic!("expected denied response, got {other:?}"),
        }
    }

    #[test]
    fn test_check_allowed_shape() {
        let response = check_allowed("bob");
        assert_eq!(response.status.unwrap().code, Code::Ok as i32);
        match response.http_response {
            Some(check_response::HttpResponse::OkResponse(ok)) => {
                assert_eq!(ok.headers.len(), 1);
                assert_eq!(ok.headers[0].header.as_ref().unwrap().value, "bob");
            }
            other => panic!("expected ok response, got {other:?}"),
        }
    }

    #[test]
    fn test_immediate_denied_shape() {
        let response = immediate_denied(&AuthError::SignatureInvalid);
        match response.response {
            Some(processing_response::Response::ImmediateResponse(immediate)) => {
                assert_eq!(immediate.status.unwrap().code, 403);
                assert_eq!(immediate.body, b"denied: token signature is invalid");
            }
            other => panic!("expected immediate response, got {other:?}"),
        }
    }

    #[test]
    fn test_continue_responses_have_no_mutation() {
        let headers = continue_headers().response.unwrap();
        assert_eq!(headers.status, common_response::ResponseStatus::Continue as i32);
        assert!(headers.header_mutation.is_none());
        assert!(continue_body().response.unwrap().header_mutation.is_none());
        assert!(empty_trailers().header_mutation.is_none());
    }
}
