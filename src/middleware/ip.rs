//! Client address resolution.
//!
//! The service is meant to sit behind a reverse proxy (the same one that
//! stamps `x-tracing-id`), so proxy headers take precedence over the socket
//! peer address.
//!
//! # Security Warning
//!
//! `X-Forwarded-For` and `X-Real-IP` are client-controlled unless the proxy
//! overwrites them. A client that can reach the service directly can change
//! its derived idempotency key by spoofing these headers:
//!
//! ```nginx
//! proxy_set_header X-Real-IP $remote_addr;
//! proxy_set_header X-Forwarded-For $remote_addr;
//! ```

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

/// Where a client address was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractedIp<'a> {
    /// First entry of X-Forwarded-For.
    FromXff(&'a str),
    /// X-Real-IP header.
    FromRealIp(&'a str),
    /// No proxy header present.
    NotFound,
}

#[inline]
fn extract_ip_from_headers<B>(req: &Request<B>) -> ExtractedIp<'_> {
    // Format: "client, proxy1, proxy2" - we want the first (client) IP
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first_ip) = value.split(',').next()
        && !first_ip.trim().is_empty()
    {
        return ExtractedIp::FromXff(first_ip.trim());
    }

    if let Some(real_ip) = req.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && !value.trim().is_empty()
    {
        return ExtractedIp::FromRealIp(value.trim());
    }

    ExtractedIp::NotFound
}

/// Resolve the client address of a request.
///
/// Checks in order: `X-Forwarded-For` (first entry), `X-Real-IP`, the peer
/// address from `ConnectInfo`. Returns an empty string when none is known.
pub fn client_ip<B>(req: &Request<B>) -> String {
    match extract_ip_from_headers(req) {
        ExtractedIp::FromXff(ip) | ExtractedIp::FromRealIp(ip) => ip.to_string(),
        ExtractedIp::NotFound => req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_default(),
    }
}
