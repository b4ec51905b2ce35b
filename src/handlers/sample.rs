//! Sample endpoints used to exercise the middleware stack.
//!
//! # Endpoints
//!
//! - `GET /sample/ping` - liveness envelope, not idempotent
//! - `POST /sample/echo` - echoes the JSON body (idempotent)
//! - `POST /sample/fail` - always answers with a `FAILED` envelope (idempotent)
//! - `POST /sample/timeout` - slow downstream call that outlasts the idempotency wait
//!
//! A `FAILED` envelope is a normal 200 response: it is cached and replayed
//! like any other. Only transport-level errors (4xx/5xx) bypass the cache.

use axum::body::Bytes;
use axum::extract::State;
use serde_json::Value;
use tracing::instrument;

use crate::error::AppResult;
use crate::models::{ApiResponse, EchoData, FailureData, PingData, ThirdPartyData};
use crate::state::AppState;

/// `GET /sample/ping`
#[instrument]
pub async fn ping() -> ApiResponse<PingData> {
    ApiResponse::success(PingData {
        message: "pong".to_string(),
    })
}

/// `POST /sample/echo`
///
/// An empty body echoes `{}`. A body that is not JSON is rejected with 400.
#[instrument(skip(body), fields(body_len = body.len()))]
pub async fn echo(body: Bytes) -> AppResult<ApiResponse<EchoData>> {
    let echo = if body.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(&body)?
    };

    Ok(ApiResponse::success(EchoData { echo }))
}

/// `POST /sample/fail`
#[instrument]
pub async fn fail() -> ApiResponse<FailureData> {
    ApiResponse::failed(
        FailureData {
            error: "Intentional failure for testing".to_string(),
        },
        "Request failed",
    )
}

/// `POST /sample/timeout`
#[instrument(skip(state))]
pub async fn timeout(State(state): State<AppState>) -> ApiResponse<ThirdPartyData> {
    state.sample.simulate_third_party_call().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::EnvelopeStatus;

    #[tokio::test]
    async fn test_ping() {
        let response = ping().await;
        assert_eq!(response.status, EnvelopeStatus::Success);
        assert_eq!(response.data.unwrap().message, "pong");
    }

    #[tokio::test]
    async fn test_echo_returns_body() {
        let response = echo(Bytes::from_static(br#"{"order":42}"#)).await.unwrap();
        assert_eq!(response.data.unwrap().echo, serde_json::json!({"order": 42}));
    }

    #[tokio::test]
    async fn test_echo_empty_body_is_empty_object() {
        let response = echo(Bytes::new()).await.unwrap();
        assert_eq!(response.data.unwrap().echo, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_echo_rejects_non_json() {
        let err = echo(Bytes::from_static(b"not json")).await.unwrap_err();
        assert!(matches!(err, AppError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_fail_envelope() {
        let response = fail().await;
        assert_eq!(response.status, EnvelopeStatus::Failed);
        assert_eq!(response.message.as_deref(), Some("Request failed"));
        assert_eq!(
            response.data.unwrap().error,
            "Intentional failure for testing"
        );
    }
}
