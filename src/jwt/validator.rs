//! JWT Validator with type-state pattern support
//!
//! Holds the single verification key and drives a token through its states.

use std::sync::Arc;

use crate::error::AuthError;
use crate::jwt::token::{Token, Unvalidated};
use crate::keys::VerificationKey;

/// Validates bearer tokens against the configured RSA public key.
///
/// Cheap to clone; every clone shares the same immutable key.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    key: Arc<VerificationKey>,
    leeway_seconds: u64,
}

impl TokenValidator {
    /// Creates a validator with no clock-skew allowance
    pub fn new(key: Arc<VerificationKey>) -> Self {
        Self {
            key,
            leeway_seconds: 0,
        }
    }

    /// Allows `exp`/`nbf`/`iat` to be off by up to `seconds`
    #[must_use]
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }

    /// Validates a bearer value (prefix already stripped) and returns its subject.
    pub fn validate(&self, raw_token: &str) -> Result<String, AuthError> {
        let validated = Token::<Unvalidated>::parse(raw_token)?
            .verify(&self.key, self.leeway_seconds)?
            .validate_claims()?;

        Ok(validated.into_subject())
    }
}
