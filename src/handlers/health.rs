//! Health endpoint.
//!
//! `GET /health` always answers 200; a failing cache store only downgrades
//! the reported status to `degraded`, since the deduplicator fails open.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::{instrument, warn};

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "healthy",
///   "cache_backend": "memory",
///   "cache_healthy": true,
///   "version": "0.1.0",
///   "timestamp": "2024-01-15T10:30:00Z"
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_healthy = match state.cache.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if cache_healthy { "healthy" } else { "degraded" }.to_string(),
        cache_backend: state.cache.provider_name().to_string(),
        cache_healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}
