//! In-process cache store using Moka.
//!
//! Not shared between processes: each instance deduplicates only the
//! requests it sees itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use tracing::debug;

use super::{CacheResult, CacheStore};

/// Cached value together with the TTL it was written with.
#[derive(Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Duration,
}

/// Expires each entry after the TTL passed to its own `set`.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory cache store with per-write TTL and bounded capacity.
///
/// The TTL given at construction is a ceiling: no entry outlives it, even
/// when written with a longer one.
#[derive(Clone)]
pub struct MemoryCacheStore {
    cache: moka::future::Cache<String, Entry>,
    max_ttl: Duration,
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .field("max_ttl", &self.max_ttl)
            .finish()
    }
}

impl MemoryCacheStore {
    /// Create a store holding at most `max_entries` values for at most `max_ttl` each.
    pub fn new(max_entries: u64, max_ttl: Duration) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(max_ttl)
            .expire_after(PerEntryTtl)
            .build();

        debug!(
            max_entries,
            max_ttl_seconds = max_ttl.as_secs(),
            "In-memory cache store created"
        );

        Self { cache, max_ttl }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let result = self.cache.get(key).await.map(|entry| entry.value.to_string());

        if result.is_some() {
            debug!(key, "Cache HIT (memory)");
        } else {
            debug!(key, "Cache MISS (memory)");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let entry = Entry {
            value: Arc::from(value),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        debug!(key, ttl_ms = ttl.as_millis() as u64, "Cache SET (memory)");
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_get_returns_none_on_miss() {
        let store = MemoryCacheStore::new(100, Duration::from_secs(60));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_set_and_get() {
        let store = MemoryCacheStore::new(100, Duration::from_secs(60));
        let value = r#"{"status":"SUCCESS"}"#;

        store
            .set("idempotency:abc", value, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            store.get("idempotency:abc").await.unwrap(),
            Some(value.to_string())
        );
    }

    #[tokio::test]
    async fn test_memory_set_overwrites() {
        let store = MemoryCacheStore::new(100, Duration::from_secs(60));
        let ttl = Duration::from_secs(60);

        store.set("k", "first", ttl).await.unwrap();
        store.set("k", "second", ttl).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_memory_entry_expires() {
        let store = MemoryCacheStore::new(100, Duration::from_millis(50));

        store.set("k", "v", Duration::from_millis(50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_honours_per_write_ttl() {
        let store = MemoryCacheStore::new(100, Duration::from_secs(60));

        store.set("short", "v", Duration::from_millis(50)).await.unwrap();
        store.set("long", "v", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_memory_overwrite_resets_ttl() {
        let store = MemoryCacheStore::new(100, Duration::from_secs(60));

        store.set("k", "first", Duration::from_millis(50)).await.unwrap();
        store.set("k", "second", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.get("k").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_memory_health_check() {
        let store = MemoryCacheStore::new(10, Duration::from_secs(1));
        assert!(store.health_check().await.unwrap());
        assert_eq!(store.provider_name(), "memory");
    }
}
