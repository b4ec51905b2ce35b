//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP span per request
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │    Trace ID      │ ← Reads x-tracing-id into an extension
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  Request Logger  │ ← Entry / watchdog / terminal logs
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │   Idempotency    │ ← FromCache | Original | TimedOut (idempotent routes only)
//! └────────┬─────────┘
//!          ▼
//!      Handler
//! ```
//!
//! The logger sits outside the deduplicator so its terminal log sees the
//! final `x-idempotency-status` response header.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::idempotency::RouteTable;
use crate::middleware::{TraceIdLayer, deduplicate, log_requests};
use crate::state::AppState;

/// Routes whose responses are deduplicated through the cache.
pub fn route_table() -> RouteTable {
    RouteTable::new()
        .idempotent(Method::GET, "/")
        .idempotent(Method::POST, "/sample/echo")
        .idempotent(Method::POST, "/sample/fail")
        .idempotent(Method::POST, "/sample/timeout")
}

/// Build the application router with all routes and middleware configured.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;
    let cors = build_cors_layer(&config.cors_allowed_origins);

    let mut router = Router::new()
        .route("/", get(handlers::hello))
        .route("/health", get(handlers::health_check))
        .route("/sample/ping", get(handlers::ping))
        .route("/sample/echo", post(handlers::echo))
        .route("/sample/fail", post(handlers::fail))
        .route("/sample/timeout", post(handlers::timeout));

    // Applied bottom to top: the last layer added runs first
    info!(
        max_size_mb = config.max_request_body_size / (1024 * 1024),
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));
    router = router.layer(from_fn_with_state(state.clone(), deduplicate));
    router = router.layer(from_fn_with_state(state.clone(), log_requests));
    router = router.layer(TraceIdLayer::new());
    router = router.layer(TraceLayer::new_for_http());
    router = router.layer(cors);

    info!(
        idempotent_routes = state.routes.len(),
        wait_ms = config.idempotency_wait.as_millis() as u64,
        "Idempotency middleware configured"
    );

    router.with_state(state)
}

/// Build CORS layer from configuration.
///
/// # Security Note
///
/// Using `*` (any origin) is convenient for development but should be
/// avoided in production. Specify explicit origins instead.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
