//! Shared fixtures: RSA test keys, token minting and header builders.

#![allow(dead_code)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use edge_authz::authz::Authorizer;
use edge_authz::jwt::{Claims, TokenValidator};
use edge_authz::keys::VerificationKey;
use edge_authz::proto::envoy::config::core::v3::{HeaderMap, HeaderValue};

pub const PUBLIC_KEY: &str = include_str!("../fixtures/public_key.pem");
pub const SIGNING_KEY: &str = include_str!("../fixtures/signing_key.pem");
pub const OTHER_SIGNING_KEY: &str = include_str!("../fixtures/other_signing_key.pem");

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn verification_key() -> Arc<VerificationKey> {
    Arc::new(VerificationKey::from_pem(PUBLIC_KEY).expect("fixture key must load"))
}

pub fn validator() -> TokenValidator {
    TokenValidator::new(verification_key())
}

pub fn authorizer() -> Authorizer {
    Authorizer::new(validator())
}

/// Subject plus a five minute validity window starting now.
pub fn valid_claims(subject: &str) -> Claims {
    let now = now();
    Claims {
        sub: Some(subject.to_string()),
        iat: Some(now),
        exp: Some(now + 300),
        nbf: None,
    }
}

pub fn sign_with(key_pem: &str, algorithm: Algorithm, claims: &Claims) -> String {
    let key = EncodingKey::from_rsa_pem(key_pem.as_bytes()).expect("fixture signing key");
    encode(&Header::new(algorithm), claims, &key).expect("token encodes")
}

/// RS256 token signed by the key the service trusts.
pub fn sign(claims: &Claims) -> String {
    sign_with(SIGNING_KEY, Algorithm::RS256, claims)
}

/// Correctly signed token over arbitrary header JSON and payload bytes.
pub fn sign_raw(header_json: &str, payload: &[u8]) -> String {
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY.as_bytes()).expect("fixture signing key");
    let message = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let signature = jsonwebtoken::crypto::sign(message.as_bytes(), &key, Algorithm::RS256)
        .expect("message signs");
    format!("{message}.{signature}")
}

pub fn header_map(entries: &[(&str, &str)]) -> HeaderMap {
    HeaderMap {
        headers: entries
            .iter()
            .map(|(key, value)| HeaderValue {
                key: key.to_string(),
                value: value.to_string(),
                raw_value: Vec::new(),
            })
            .collect(),
    }
}

pub fn bearer_headers(token: &str) -> HeaderMap {
    header_map(&[
        (":method", "GET"),
        (":path", "/api"),
        ("authorization", &format!("Bearer {token}")),
    ])
}
