//! Claims carried in the token payload.

use serde::{Deserialize, Serialize};

/// Payload claims the edge cares about. Everything else in the payload is
/// ignored; temporal claims are optional and enforced only when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the identity passed downstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued-at, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Not-before, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl Claims {
    /// Subject, if present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|sub| !sub.is_empty())
    }

    /// True when `iat` lies further in the future than `leeway` allows.
    pub fn issued_in_future(&self, now: i64, leeway: u64) -> bool {
        let leeway = i64::try_from(leeway).unwrap_or(i64::MAX);
        self.iat
            .is_some_and(|iat| iat > now.saturating_add(leeway))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_subject_is_missing() {
        let claims = Claims {
            sub: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(claims.subject(), None);
    }

    #[test]
    fn test_subject_present() {
        let claims: Claims = serde_json::from_str(r#"{"sub":"user-1","iat":1}"#).unwrap();
        assert_eq!(claims.subject(), Some("user-1"));
    }

    #[test]
    fn test_unknown_claims_are_ignored() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"u","scope":"a b","aud":["x"]}"#).unwrap();
        assert_eq!(claims.subject(), Some("u"));
    }

    #[test]
    fn test_issued_in_future_respects_leeway() {
        let claims = Claims {
            iat: Some(1_000),
            ..Default::default()
        };
        assert!(claims.issued_in_future(900, 0));
        assert!(!claims.issued_in_future(900, 100));
        assert!(!claims.issued_in_future(1_000, 0));
        assert!(!Claims::default().issued_in_future(0, 0));
    }
}
