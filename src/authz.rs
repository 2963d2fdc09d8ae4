//! The allow/deny decision shared by both gRPC adapters.

use crate::error::AuthError;
use crate::headers::{HeaderCollection, extract_bearer};
use crate::jwt::TokenValidator;

/// Outcome of authorizing one request. Built per request and consumed
/// immediately by the adapter that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Valid token; `subject` goes into the identity header
    Identity {
        /// Token subject
        subject: String,
    },
    /// No usable token
    Rejected {
        /// Why the request is denied
        reason: AuthError,
    },
}

impl Decision {
    /// True for [`Decision::Identity`]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Identity { .. })
    }
}

impl From<Result<String, AuthError>> for Decision {
    fn from(result: Result<String, AuthError>) -> Self {
        match result {
            Ok(subject) => Self::Identity { subject },
            Err(reason) => Self::Rejected { reason },
        }
    }
}

/// Header extraction followed by token validation.
///
/// Protocol-agnostic: the adapters hand in whatever header shape they have.
#[derive(Debug, Clone)]
pub struct Authorizer {
    validator: TokenValidator,
}

impl Authorizer {
    /// Wraps a validator
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }

    /// Decides on a request given its headers.
    pub fn authorize<C>(&self, headers: &C) -> Decision
    where
        C: HeaderCollection + ?Sized,
    {
        extract_bearer(headers)
            .and_then(|token| self.validator.validate(&token))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_from_result() {
        let allowed = Decision::from(Ok("alice".to_string()));
        assert!(allowed.is_allowed());
        assert_eq!(
            allowed,
            Decision::Identity {
                subject: "alice".to_string()
            }
        );

        let denied = Decision::from(Err(AuthError::SubjectMissing));
        assert!(!denied.is_allowed());
        assert_eq!(
            denied,
            Decision::Rejected {
                reason: AuthError::SubjectMissing
            }
        );
    }
}
