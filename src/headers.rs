//! Bearer extraction shared by every host protocol.
//!
//! Hosts hand headers over in several shapes: entries carrying either a
//! string value or raw bytes, or a plain string map. Each shape implements
//! [`HeaderCollection`] and is looked up the same way. Nothing here depends
//! on a wire protocol; the gRPC layer adds the impls for its own types.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::AuthError;

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Scheme prefix, matched literally (case and single space included).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Header written with the validated subject. Never read from requests.
pub const IDENTITY_HEADER: &str = "x-uid";

/// One header entry as seen by the extractor.
#[derive(Debug, Clone, Copy)]
pub struct HeaderField<'a> {
    /// Header name, compared case-insensitively
    pub key: &'a str,
    /// Decoded string value, may be empty
    pub value: &'a str,
    /// Raw bytes, used when `value` is empty
    pub raw_value: &'a [u8],
}

impl<'a> HeaderField<'a> {
    /// Prefers the string value and falls back to the raw bytes.
    pub fn resolved_value(&self) -> Cow<'a, str> {
        if self.value.is_empty() && !self.raw_value.is_empty() {
            String::from_utf8_lossy(self.raw_value)
        } else {
            Cow::Borrowed(self.value)
        }
    }
}

/// A protocol-specific bag of headers.
pub trait HeaderCollection {
    /// Entries in wire order.
    fn header_fields(&self) -> impl Iterator<Item = HeaderField<'_>>;
}

/// A map has no wire order. Envoy lower-cases the keys it puts here, so
/// lower-case keys come first, then the rest sorted by key.
impl HeaderCollection for HashMap<String, String> {
    fn header_fields(&self) -> impl Iterator<Item = HeaderField<'_>> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|(a, _), (b, _)| (has_upper_case(a), a).cmp(&(has_upper_case(b), b)));

        entries.into_iter().map(|(key, value)| HeaderField {
            key,
            value,
            raw_value: &[],
        })
    }
}

fn has_upper_case(key: &str) -> bool {
    key.bytes().any(|b| b.is_ascii_uppercase())
}

impl HeaderCollection for [HeaderField<'_>] {
    fn header_fields(&self) -> impl Iterator<Item = HeaderField<'_>> {
        self.iter().map(|field| HeaderField {
            key: field.key,
            value: field.value,
            raw_value: field.raw_value,
        })
    }
}

/// First entry named `name` (any case) that resolves to a non-empty value.
pub fn find_header<'a, C>(headers: &'a C, name: &str) -> Option<Cow<'a, str>>
where
    C: HeaderCollection + ?Sized,
{
    headers
        .header_fields()
        .filter(|field| field.key.eq_ignore_ascii_case(name))
        .map(|field| field.resolved_value())
        .find(|value| !value.is_empty())
}

/// Locates the `authorization` header and strips the `Bearer ` prefix.
///
/// Success says nothing about the token itself; it may still be rejected by
/// the validator.
pub fn extract_bearer<C>(headers: &C) -> Result<String, AuthError>
where
    C: HeaderCollection + ?Sized,
{
    let value = find_header(headers, AUTHORIZATION_HEADER).ok_or(AuthError::AuthorizationMissing)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::AuthorizationInvalid)?;

    // A bare scheme carries no credential at all.
    if token.is_empty() {
        return Err(AuthError::AuthorizationMissing);
    }
    Ok(token.to_string())
}
