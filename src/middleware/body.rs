//! Body buffering shared by the logging and idempotency middleware.
//!
//! Both need the full request body (for fingerprints and log details) and
//! the full response body (for envelope status and caching). Buffered
//! bodies are put back as `Body::from(bytes)` so inner layers see them
//! unchanged.

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::header::CONTENT_LENGTH;
use axum::http::response::Parts;
use axum::response::Response;
use http_body_util::LengthLimitError;

use crate::error::{AppError, AppResult};

/// Read the request body into memory, returning the rebuilt request.
///
/// # Errors
///
/// `AppError::PayloadTooLarge` if the body exceeds `limit` bytes,
/// `AppError::BadRequest` if it cannot be read.
pub async fn buffer_request(req: Request, limit: usize) -> AppResult<(Request, Bytes)> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(len) = declared
        && len > limit
    {
        return Err(too_large(limit));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| read_error(e, limit))?;

    Ok((Request::from_parts(parts, Body::from(bytes.clone())), bytes))
}

/// Read a response body into memory.
///
/// # Errors
///
/// `AppError::Internal` if the body cannot be read or exceeds `limit`.
pub async fn buffer_response(response: Response, limit: usize) -> AppResult<(Parts, Bytes)> {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to buffer response body: {e}")))?;
    Ok((parts, bytes))
}

fn read_error(e: axum::Error, limit: usize) -> AppError {
    if exceeds_limit(&e) {
        too_large(limit)
    } else {
        AppError::BadRequest(format!("Failed to read request body: {e}"))
    }
}

/// Whether a body read failed on the length limit rather than on I/O.
fn exceeds_limit(e: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(e);
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}

fn too_large(limit: usize) -> AppError {
    AppError::PayloadTooLarge(format!("Request body exceeds {limit} bytes"))
}
