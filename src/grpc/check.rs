//! ext_authz `Check`: one request, one allow/deny answer.

use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::authz::{Authorizer, Decision};
use crate::error::AuthError;
use crate::grpc::response::{check_allowed, check_denied};
use crate::proto::envoy::service::auth::v3::authorization_server::Authorization;
use crate::proto::envoy::service::auth::v3::{CheckRequest, CheckResponse};

/// Envoy `Authorization` service backed by the shared [`Authorizer`].
#[derive(Debug, Clone)]
pub struct CheckService {
    authorizer: Authorizer,
}

impl CheckService {
    /// Creates the service
    pub fn new(authorizer: Authorizer) -> Self {
        Self { authorizer }
    }

    /// Decides on a check request without touching the transport.
    ///
    /// Headers come from `header_map` when Envoy populated it, otherwise from
    /// the plain `headers` map.
    pub fn decide(&self, request: &CheckRequest) -> Decision {
        let http = request
            .attributes
            .as_ref()
            .and_then(|attributes| attributes.request.as_ref())
            .and_then(|request| request.http.as_ref());

        let Some(http) = http else {
            return Decision::Rejected {
                reason: AuthError::AuthorizationMissing,
            };
        };

        match &http.header_map {
            Some(header_map) if !header_map.headers.is_empty() => {
                self.authorizer.authorize(header_map)
            }
            _ => self.authorizer.authorize(&http.headers),
        }
    }

    /// Renders a decision in the ext_authz shape.
    pub fn respond(decision: &Decision) -> CheckResponse {
        match decision {
            Decision::Identity { subject } => check_allowed(subject),
            Decision::Rejected { reason } => check_denied(reason),
        }
    }
}

#[tonic::async_trait]
impl Authorization for CheckService {
    #[instrument(
        name = "check",
        skip(self, request),
        fields(correlation_id = %Uuid::new_v4())
    )]
    async fn check(
        &self,
        request: Request<CheckRequest>,
    ) -> Result<Response<CheckResponse>, Status> {
        let decision = self.decide(request.get_ref());

        match &decision {
            Decision::Identity { subject } => {
                info!(subject = %subject, "Request authorized");
            }
            Decision::Rejected { reason } => {
                warn!(
                    error_code = reason.code().as_str(),
                    stage = reason.stage(),
                    reason = %reason,
                    "Request denied"
                );
            }
        }

        Ok(Response::new(Self::respond(&decision)))
    }
}
