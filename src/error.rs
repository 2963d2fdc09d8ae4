//! Error handling module with type-safe, non-exhaustive error types
//!
//! Every failure that ends in a denial is an [`AuthError`]. Its `Display`
//! output is the reason string that is echoed to the caller, so the messages
//! are stable and never carry token material.

use thiserror::Error;

/// Non-exhaustive error enum for forward compatibility.
///
/// Extraction failures and validation failures share one type because both
/// are rendered the same way by the adapters: as a denial with a reason.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `authorization` header with a non-empty value
    #[error("authorization header is missing")]
    AuthorizationMissing,

    /// `authorization` header does not use the `Bearer ` scheme
    #[error("authorization header is invalid")]
    AuthorizationInvalid,

    /// Token does not have exactly three dot-separated segments
    #[error("token format is invalid")]
    TokenMalformed,

    /// Header segment is not base64url-encoded JSON carrying `alg`
    #[error("token header is invalid")]
    TokenHeaderInvalid,

    /// Header declares an algorithm other than RS256
    #[error("token algorithm is not supported")]
    UnsupportedAlgorithm {
        /// Algorithm named by the token header
        alg: String,
    },

    /// Signature does not verify against the configured key
    #[error("token signature is invalid")]
    SignatureInvalid,

    /// Payload or signature segment is not valid base64url
    #[error("token encoding is invalid")]
    EncodingInvalid,

    /// Payload does not decode into claims
    #[error("token payload is invalid")]
    PayloadInvalid,

    /// `exp` is in the past
    #[error("token is expired")]
    TokenExpired,

    /// `nbf` or `iat` is in the future
    #[error("token is not yet valid")]
    TokenNotYetValid,

    /// Signature verified but `sub` is absent or empty
    #[error("subject is missing")]
    SubjectMissing,
}

/// Stable machine-readable codes, used as structured log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ErrorCode {
    AuthHeaderMissing,
    AuthHeaderInvalid,
    TokenMalformed,
    TokenAlgorithm,
    TokenSignature,
    TokenExpired,
    TokenNotYetValid,
    SubjectMissing,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthHeaderMissing => "AUTH_HEADER_MISSING",
            Self::AuthHeaderInvalid => "AUTH_HEADER_INVALID",
            Self::TokenMalformed => "TOKEN_MALFORMED",
            Self::TokenAlgorithm => "TOKEN_ALGORITHM_UNSUPPORTED",
            Self::TokenSignature => "TOKEN_SIGNATURE_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            Self::SubjectMissing => "SUBJECT_MISSING",
        }
    }
}

impl AuthError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AuthorizationMissing => ErrorCode::AuthHeaderMissing,
            Self::AuthorizationInvalid => ErrorCode::AuthHeaderInvalid,
            Self::TokenMalformed
            | Self::TokenHeaderInvalid
            | Self::EncodingInvalid
            | Self::PayloadInvalid => ErrorCode::TokenMalformed,
            Self::UnsupportedAlgorithm { .. } => ErrorCode::TokenAlgorithm,
            Self::SignatureInvalid => ErrorCode::TokenSignature,
            Self::TokenExpired => ErrorCode::TokenExpired,
            Self::TokenNotYetValid => ErrorCode::TokenNotYetValid,
            Self::SubjectMissing => ErrorCode::SubjectMissing,
        }
    }

    /// True for failures raised before a token was seen at all
    pub fn is_extraction_error(&self) -> bool {
        matches!(self, Self::AuthorizationMissing | Self::AuthorizationInvalid)
    }

    /// Log label for where the request was turned away
    pub fn stage(&self) -> &'static str {
        if self.is_extraction_error() {
            "extract"
        } else {
            "validate"
        }
    }

    /// Body text sent back with a denial
    pub fn denial_body(&self) -> String {
        format!("denied: {self}")
    }
}

// ============================================================================
// From trait implementations for automatic error conversion
// ============================================================================

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::RsaFailedSigning => AuthError::SignatureInvalid,
            ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => AuthError::UnsupportedAlgorithm {
                alg: String::new(),
            },
            ErrorKind::InvalidToken => AuthError::TokenMalformed,
            ErrorKind::Base64(_) => AuthError::EncodingInvalid,
            _ => AuthError::PayloadInvalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::{Error as JwtError, ErrorKind};

    #[test]
    fn test_reason_strings_are_stable() {
        assert_eq!(
            AuthError::AuthorizationMissing.to_string(),
            "authorization header is missing"
        );
        assert_eq!(
            AuthError::AuthorizationInvalid.to_string(),
            "authorization header is invalid"
        );
        assert_eq!(AuthError::SubjectMissing.to_string(), "subject is missing");
        assert_eq!(
            AuthError::SignatureInvalid.to_string(),
            "token signature is invalid"
        );
    }

    #[test]
    fn test_algorithm_is_not_echoed() {
        let err = AuthError::UnsupportedAlgorithm {
            alg: "<script>".to_string(),
        };
        assert_eq!(err.to_string(), "token algorithm is not supported");
    }

    #[test]
    fn test_denial_body_prefix() {
        assert_eq!(
            AuthError::TokenExpired.denial_body(),
            "denied: token is expired"
        );
    }

    #[test]
    fn test_jsonwebtoken_error_mapping() {
        let cases = [
            (ErrorKind::ExpiredSignature, AuthError::TokenExpired),
            (ErrorKind::ImmatureSignature, AuthError::TokenNotYetValid),
            (ErrorKind::InvalidSignature, AuthError::SignatureInvalid),
            (ErrorKind::InvalidToken, AuthError::TokenMalformed),
        ];
        for (kind, expected) in cases {
            assert_eq!(AuthError::from(JwtError::from(kind)), expected);
        }
    }

    #[test]
    fn test_extraction_errors() {
        assert!(AuthError::AuthorizationMissing.is_extraction_error());
        assert!(AuthError::AuthorizationInvalid.is_extraction_error());
        assert!(!AuthError::SubjectMissing.is_extraction_error());
        assert_eq!(AuthError::AuthorizationInvalid.stage(), "extract");
        assert_eq!(AuthError::TokenExpired.stage(), "validate");
    }

    #[test]
    fn test_codes_distinguish_categories() {
        assert_eq!(AuthError::TokenHeaderInvalid.code(), ErrorCode::TokenMalformed);
        assert_eq!(AuthError::SubjectMissing.code().as_str(), "SUBJECT_MISSING");
        assert_ne!(
            AuthError::TokenExpired.code(),
            AuthError::TokenNotYetValid.code()
        );
    }
}
