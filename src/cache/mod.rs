//! Cache stores backing the idempotency deduplicator.
//!
//! The deduplicator only needs two operations from a store: `get` and
//! `set` with a TTL. Both are best-effort; callers treat read errors as a
//! miss and swallow write errors.
//!
//! # Providers
//!
//! - **Memory** (`moka`): in-process, bounded capacity, single instance only
//! - **Redis**: shared across instances, selected with `CACHE_BACKEND=redis`

mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{CacheBackend, Config};

pub use self::memory::MemoryCacheStore;
pub use self::redis::RedisCacheStore;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to connect to cache backend
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    /// Generic backend error
    #[error("Cache backend error: {0}")]
    BackendError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value store with per-write TTL.
///
/// Values are serialized response envelopes. No transactional guarantee is
/// assumed: two concurrent writers to one key leave whichever wrote last.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `Ok(Some(value))` on hit, `Ok(None)` on miss.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Check if the cache backend is reachable.
    async fn health_check(&self) -> CacheResult<bool>;

    /// Name of the provider, for logs and the health endpoint.
    fn provider_name(&self) -> &'static str;
}

/// Build the cache store selected by configuration.
///
/// # Errors
///
/// Returns `CacheError::ConnectionError` if the Redis backend is selected and
/// cannot be reached.
pub async fn build_cache_store(config: &Config) -> CacheResult<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new(
            config.cache_max_entries,
            config.cache_ttl,
        )),
        CacheBackend::Redis => Arc::new(RedisCacheStore::connect(&config.redis_url()).await?),
    };

    info!(provider = store.provider_name(), "Cache store ready");
    Ok(store)
}
