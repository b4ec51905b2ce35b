use chrono::{DateTime, Utc};
use serde::Serialize;

/// Payload of `GET /sample/ping`.
#[derive(Debug, Serialize)]
pub struct PingData {
    pub message: String,
}

/// Payload of `POST /sample/echo`.
#[derive(Debug, Serialize)]
pub struct EchoData {
    /// The request body, as received
    pub echo: serde_json::Value,
}

/// Payload of `POST /sample/fail`.
#[derive(Debug, Serialize)]
pub struct FailureData {
    pub error: String,
}

/// Payload produced by the simulated third-party call.
#[derive(Debug, Serialize)]
pub struct ThirdPartyData {
    pub result: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service health status
    pub status: String,
    /// Name of the cache store in use
    pub cache_backend: String,
    /// Whether the cache store answered its health check
    pub cache_healthy: bool,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}
