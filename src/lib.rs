//! # Idempotency Gateway
//!
//! An Axum service demonstrating cache-backed idempotent request handling
//! with structured request logging:
//!
//! - **Deduplication**: repeat requests replay the first response from a cache
//! - **Bounded waits**: slow handlers answer `TIMEDOUT` after a fixed wait and
//!   keep running, so a retry with the same key picks up their result
//! - **Request logs**: one entry and one terminal log per request, sanitized,
//!   plus a watchdog warning for long-running requests
//! - **Pluggable cache**: in-process Moka or shared Redis
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (CORS → Trace → Trace ID → Logger → Idempotency)│
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (root, sample, health)                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Deduplicator (key, lookup, race, write-back)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CacheStore (Moka | Redis)                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use idempotency_gateway::cache::build_cache_store;
//! use idempotency_gateway::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let cache = build_cache_store(&config).await?;
//!
//!     let state = AppState::new(config, cache);
//!     let app = build_router(state);
//!
//!     // Start the server...
//!     Ok(())
//! }
//! ```
//!
//! ## Idempotency Headers
//!
//! ```bash
//! curl -i -X POST -H "x-idempotency-key: order-42" \
//!      -d '{"sku":"A1"}' http://localhost:3000/sample/echo
//! # x-idempotency-status: Original, then FromCache on retry
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod idempotency;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use routes::build_router;
pub use state::AppState;
