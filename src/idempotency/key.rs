//! Idempotency key resolution.
//!
//! A key is either supplied by the client in `x-idempotency-key` or derived
//! from a fingerprint of the request:
//!
//! ```text
//! sha256(ip ␟ url ␟ body ␟ authorization ␟ x-workspace ␟ x-channel ␟ x-tracing-id)
//! ```
//!
//! Missing fields hash as the empty string, so derivation never fails.

use std::borrow::Cow;
use std::fmt;

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Header carrying a client-supplied key; echoed back on the response.
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Prefix of every cache entry written by the deduplicator.
pub const CACHE_KEY_PREFIX: &str = "idempotency:";

/// Headers folded into the fingerprint, in hashing order.
pub const FINGERPRINT_HEADERS: [&str; 4] =
    ["authorization", "x-workspace", "x-channel", "x-tracing-id"];

const FIELD_SEPARATOR: &[u8] = b"\x1f";

/// Identifies one logical request and therefore one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key supplied by the client, if the header is present, readable and non-empty.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the cache entry holding this request's response.
    pub fn cache_key(&self) -> String {
        format!("{CACHE_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The request fields a derived key is computed from.
#[derive(Debug, Clone, Default)]
pub struct Fingerprint<'a> {
    pub client_ip: &'a str,
    /// Original path and query
    pub url: &'a str,
    pub body: &'a [u8],
    /// Values of [`FINGERPRINT_HEADERS`], in order
    pub headers: [&'a str; 4],
}

impl<'a> Fingerprint<'a> {
    /// Collect fingerprint fields from a request's parts.
    pub fn new(client_ip: &'a str, url: &'a str, body: &'a [u8], headers: &'a HeaderMap) -> Self {
        let header = move |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
        };

        Self {
            client_ip,
            url,
            body,
            headers: FINGERPRINT_HEADERS.map(header),
        }
    }

    /// Hash the fingerprint into a lowercase hex SHA-256 key.
    pub fn derive_key(&self) -> IdempotencyKey {
        let body = serialize_body(self.body);

        let mut hasher = Sha256::new();
        hasher.update(self.client_ip.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(self.url.as_bytes());
        hasher.update(FIELD_SEPARATOR);
        hasher.update(body.as_bytes());
        for value in self.headers {
            hasher.update(FIELD_SEPARATOR);
            hasher.update(value.as_bytes());
        }

        IdempotencyKey(format!("{:x}", hasher.finalize()))
    }
}

/// Stable text form of a request body for hashing.
///
/// - empty body: `{}`
/// - JSON: compact, with object keys sorted at every level
/// - other UTF-8 text: as-is
/// - anything else: empty string
pub fn serialize_body(body: &[u8]) -> Cow<'_, str> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Cow::Borrowed("{}");
    }

    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return Cow::Owned(serde_json::to_string(&canonicalize(value)).unwrap_or_default());
    }

    match std::str::from_utf8(body) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Borrowed(""),
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
