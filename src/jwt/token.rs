//! Type-State JWT Token with compile-time validation guarantees
//!
//! A bearer token moves through three states: parsed (`Unvalidated`), signature
//! and temporal claims verified (`SignatureValidated`), and subject checked
//! (`Validated`). Only a `Validated` token yields an identity.

use std::marker::PhantomData;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, Validation, decode};
use serde::Deserialize;

use crate::error::AuthError;
use crate::jwt::claims::Claims;
use crate::keys::VerificationKey;

/// The only signing algorithm the edge accepts.
pub const ACCEPTED_ALGORITHM: &str = "RS256";

// ============================================================================
// Sealed Trait Pattern for Token States
// ============================================================================

mod private {
    /// Sealed trait to prevent external implementations
    pub trait Sealed {}
}

/// Marker trait for token validation states
pub trait TokenState: private::Sealed {
    /// Human-readable state name for debugging
    fn state_name() -> &'static str;
}

/// Unvalidated token - structure and header algorithm checked only
pub struct Unvalidated;
impl private::Sealed for Unvalidated {}
impl TokenState for Unvalidated {
    fn state_name() -> &'static str {
        "Unvalidated"
    }
}

/// Signature validated - RS256 signature and temporal claims verified
pub struct SignatureValidated;
impl private::Sealed for SignatureValidated {}
impl TokenState for SignatureValidated {
    fn state_name() -> &'static str {
        "SignatureValidated"
    }
}

/// Fully validated - carries a non-empty subject
pub struct Validated;
impl private::Sealed for Validated {}
impl TokenState for Validated {
    fn state_name() -> &'static str {
        "Validated"
    }
}

/// Just enough of the JOSE header to reject foreign algorithms up front.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

// ============================================================================
// Type-State Token Wrapper
// ============================================================================

/// Type-state token wrapper that enforces validation order at compile time
pub struct Token<'a, State: TokenState> {
    raw: &'a str,
    claims: Claims,
    _state: PhantomData<State>,
}

impl<'a> Token<'a, Unvalidated> {
    /// Checks the three-segment shape and the declared algorithm.
    ///
    /// The header is inspected before any key is touched, so `none`, HMAC or
    /// any other scheme is refused regardless of what the rest carries.
    pub fn parse(raw: &'a str) -> Result<Self, AuthError> {
        let mut segments = raw.split('.');
        let header = segments.next().unwrap_or_default();
        if segments.count() != 2 {
            return Err(AuthError::TokenMalformed);
        }

        let header_json = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| AuthError::TokenHeaderInvalid)?;
        let header: RawHeader =
            serde_json::from_slice(&header_json).map_err(|_| AuthError::TokenHeaderInvalid)?;

        if header.alg != ACCEPTED_ALGORITHM {
            return Err(AuthError::UnsupportedAlgorithm { alg: header.alg });
        }

        Ok(Token {
            raw,
            claims: Claims::default(),
            _state: PhantomData,
        })
    }

    /// Verifies the RS256 signature and the `exp`/`nbf`/`iat` window.
    pub fn verify(
        self,
        key: &VerificationKey,
        leeway: u64,
    ) -> Result<Token<'a, SignatureValidated>, AuthError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = leeway;

        let token_data = decode::<Claims>(self.raw, key.decoding_key(), &validation)?;

        let now = chrono::Utc::now().timestamp();
        if token_data.claims.issued_in_future(now, leeway) {
            return Err(AuthError::TokenNotYetValid);
        }

        Ok(Token {
            raw: self.raw,
            claims: token_data.claims,
            _state: PhantomData,
        })
    }
}

impl<'a> Token<'a, SignatureValidated> {
    /// Requires a non-empty subject and transitions to fully validated state
    pub fn validate_claims(self) -> Result<Token<'a, Validated>, AuthError> {
        if self.claims.subject().is_none() {
            return Err(AuthError::SubjectMissing);
        }

        Ok(Token {
            raw: self.raw,
            claims: self.claims,
            _state: PhantomData,
        })
    }
}

impl Token<'_, Validated> {
    /// Access claims - only available on fully validated tokens
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// The validated, non-empty subject
    pub fn subject(&self) -> &str {
        self.claims.subject().unwrap_or_default()
    }

    /// Consumes the token, keeping only the subject
    pub fn into_subject(self) -> String {
        self.claims.sub.unwrap_or_default()
    }
}

// Common methods for all states
impl<S: TokenState> Token<'_, S> {
    /// Get the current state name
    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }
}
