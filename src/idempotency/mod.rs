//! Idempotent request deduplication.
//!
//! - [`key`]: resolves the idempotency key (client header or request fingerprint)
//! - [`dedup`]: cache lookup, race-bounded execution and write-back
//! - [`status`]: the per-request cache status reported to clients and logs
//! - [`policy`]: which routes are idempotent

pub mod dedup;
pub mod key;
pub mod policy;
pub mod status;

pub use dedup::{Cacheable, Deduplicator, Outcome};
pub use key::{Fingerprint, IDEMPOTENCY_KEY_HEADER, IdempotencyKey};
pub use policy::RouteTable;
pub use status::CacheStatus;

/// Response header reporting the [`CacheStatus`] of an idempotent request.
pub const IDEMPOTENCY_STATUS_HEADER: &str = "x-idempotency-status";

/// Message returned when the bounded wait elapses.
pub const TIMED_OUT_MESSAGE: &str = "Request timed out, retry with same idempotency key";
