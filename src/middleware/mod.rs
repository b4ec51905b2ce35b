//! HTTP middleware for idempotency and observability.
//!
//! - **Trace ID**: reads `x-tracing-id` from the upstream proxy into a request extension
//! - **Request Logger**: entry, watchdog and terminal logs with sanitized context
//! - **Idempotency**: cache-backed deduplication of registered routes
//!
//! # Architecture
//!
//! ```text
//! Request → Trace ID → Request Logger → Idempotency → Handler
//!               ↓             ↓               ↓
//!          extension    request_log     x-idempotency-key
//!                         target        x-idempotency-status
//! ```

mod body;
pub mod idempotency;
pub mod ip;
pub mod logging;
pub mod trace_id;

pub use idempotency::deduplicate;
pub use ip::client_ip;
pub use logging::log_requests;
pub use trace_id::{TRACING_ID_HEADER, TraceId, TraceIdExt, TraceIdLayer};
