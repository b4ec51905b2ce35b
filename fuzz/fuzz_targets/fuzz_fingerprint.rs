//! Fuzz testing for key derivation and log sanitization.
//!
//! Both run on untrusted request bodies and headers, so neither may panic.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_fingerprint -- -max_total_time=60
//! ```
//!
//! # What This Tests
//!
//! - `Fingerprint::derive_key`: always a 64-char lowercase hex digest
//! - `serialize_body`: stable under re-serialization of its own JSON output
//! - `sanitize`: never panics on arbitrarily nested JSON

#![no_main]

use arbitrary::Arbitrary;
use axum::http::{HeaderMap, HeaderValue};
use libfuzzer_sys::fuzz_target;

use idempotency_gateway::idempotency::Fingerprint;
use idempotency_gateway::idempotency::key::serialize_body;
use idempotency_gateway::logging::sanitize;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    client_ip: &'a str,
    url: &'a str,
    body: &'a [u8],
    authorization: Option<&'a str>,
    channel: Option<&'a str>,
}

fuzz_target!(|input: Input<'_>| {
    let mut headers = HeaderMap::new();
    if let Some(value) = input.authorization.and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert("authorization", value);
    }
    if let Some(value) = input.channel.and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert("x-channel", value);
    }

    let key = Fingerprint::new(input.client_ip, input.url, input.body, &headers).derive_key();
    assert_eq!(key.as_str().len(), 64);
    assert!(key.as_str().bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));

    let serialized = serialize_body(input.body);
    if serde_json::from_slice::<serde_json::Value>(input.body).is_ok() {
        assert_eq!(serialize_body(serialized.as_bytes()), serialized);
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(input.body) {
        let _ = sanitize(&value);
    }
});
