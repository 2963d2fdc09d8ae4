//! Verification key loading.
//!
//! The service is configured with exactly one RSA public key. It is decoded
//! once at startup and shared read-only by every validation afterwards.

use std::fmt;

use jsonwebtoken::DecodingKey;
use thiserror::Error;

/// PEM tag accepted for the verification key (SubjectPublicKeyInfo).
pub const PUBLIC_KEY_PEM_TAG: &str = "PUBLIC KEY";

/// Key material errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum KeyError {
    /// Input is not PEM
    #[error("invalid PEM data: {0}")]
    InvalidPem(#[from] pem::PemError),

    /// PEM block has a tag other than `PUBLIC KEY`
    #[error("unsupported PEM type: {0}")]
    UnsupportedPemType(String),

    /// SPKI block does not hold an RSA key
    #[error("invalid key type: {0}")]
    InvalidKeyType(#[source] jsonwebtoken::errors::Error),
}

/// Immutable RSA public key used to verify bearer tokens.
#[derive(Clone)]
pub struct VerificationKey {
    decoding_key: DecodingKey,
}

impl VerificationKey {
    /// Decodes a PEM-encoded RSA public key.
    ///
    /// Literal `\n` escape sequences are turned into newlines first, so the
    /// key can be passed through a single-line environment variable.
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let normalized = normalize_pem(pem_str);

        let block = pem::parse(normalized.as_bytes())?;
        if block.tag() != PUBLIC_KEY_PEM_TAG {
            return Err(KeyError::UnsupportedPemType(block.tag().to_string()));
        }

        let decoding_key =
            DecodingKey::from_rsa_pem(normalized.as_bytes()).map_err(KeyError::InvalidKeyType)?;

        Ok(Self { decoding_key })
    }

    /// The key in the form jsonwebtoken verifies with.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey").finish_non_exhaustive()
    }
}

fn normalize_pem(pem_str: &str) -> String {
    pem_str.replace("\\n", "\n")
}
