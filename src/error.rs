use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheError;

/// Application-wide error types with appropriate HTTP status codes.
///
/// Every variant is a HandlerError from the point of view of the middleware
/// stack: the response it produces carries a [`HandlerFailure`] extension so
/// the request logger takes its error path, and its non-2xx status keeps the
/// deduplicator from caching it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cache store error: {0}")]
    Cache(#[from] CacheError),
}

/// Marker attached to error responses so outer middleware can tell a failed
/// handler apart from an ordinary response.
///
/// Holds the full, unsanitized error message for server-side logs.
#[derive(Debug, Clone)]
pub struct HandlerFailure(pub String);

/// Whether `response` is a failed handler result: flagged with
/// [`HandlerFailure`] or carrying a non-2xx status.
///
/// Framework rejections (405, extractor errors) never pass through
/// [`AppError`] but still count as failures here.
pub fn is_failure(response: &Response) -> bool {
    response.extensions().get::<HandlerFailure>().is_some() || !response.status().is_success()
}

/// Message for a failed response's error log: the [`HandlerFailure`] text
/// when present, otherwise the status line.
pub fn failure_message(response: &Response) -> String {
    response
        .extensions()
        .get::<HandlerFailure>()
        .map(|f| f.0.clone())
        .unwrap_or_else(|| response.status().to_string())
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let failure = HandlerFailure(self.to_string());

        let (status, error_type, message) = match &self {
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred. Please contact support if the issue persists."
                    .to_string(),
            ),
            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Service configuration error. Please contact support.".to_string(),
            ),
            // Cache problems are normally swallowed; reaching here means a
            // handler asked the store for something directly.
            AppError::Cache(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "cache_unavailable",
                "Cache store is temporarily unavailable. Please try again later.".to_string(),
            ),

            // Client errors - safe to show the message as it's user-facing
            AppError::SerializationError(e) => (
                StatusCode::BAD_REQUEST,
                "serialization_error",
                sanitize_serde_error(e),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        let mut response = (status, axum::Json(body)).into_response();
        response.extensions_mut().insert(failure);
        response
    }
}

/// Sanitize serde error messages to avoid leaking internal type information.
fn sanitize_serde_error(e: &serde_json::Error) -> String {
    let msg = e.to_string();

    if msg.contains("missing field")
        && let Some(start) = msg.find('`')
        && let Some(end) = msg[start + 1..].find('`')
    {
        let field = &msg[start + 1..start + 1 + end];
        return format!("Missing required field: {field}");
    }

    if msg.contains("invalid type") {
        return "Invalid data type in request body".to_string();
    }

    if msg.contains("EOF while parsing") || msg.contains("expected") {
        return "Malformed JSON in request body".to_string();
    }

    "Invalid request format".to_string()
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
