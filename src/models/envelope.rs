use std::fmt;

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of a response envelope.
///
/// Clients branch on this rather than the HTTP code: `TimedOut` is safe to
/// retry with the same idempotency key, `Failed` is a business failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnvelopeStatus {
    Success,
    Failed,
    #[serde(rename = "TIMEDOUT")]
    TimedOut,
}

impl EnvelopeStatus {
    /// Wire representation, also used as a log tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMEDOUT",
        }
    }
}

impl fmt::Display for EnvelopeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform response shape returned by every endpoint.
///
/// ```json
/// {
///   "status": "SUCCESS",
///   "data": { "message": "pong" },
///   "timestamp": "2024-01-15T10:30:00Z"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T = serde_json::Value> {
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    /// Build an envelope stamped with the current time.
    pub fn build(status: EnvelopeStatus, data: Option<T>, message: Option<String>) -> Self {
        Self {
            status,
            data,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn success(data: T) -> Self {
        Self::build(EnvelopeStatus::Success, Some(data), None)
    }

    pub fn failed(data: T, message: impl Into<String>) -> Self {
        Self::build(EnvelopeStatus::Failed, Some(data), Some(message.into()))
    }

    pub fn timed_out(data: T, message: impl Into<String>) -> Self {
        Self::build(EnvelopeStatus::TimedOut, Some(data), Some(message.into()))
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
