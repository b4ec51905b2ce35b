//! Cache-backed deduplication with a bounded wait.
//!
//! # Flow
//!
//! ```text
//!  lookup ──hit──► FromCache (handler never runs)
//!    │
//!   miss / store error (fail-open)
//!    │
//!    ▼
//!  spawn handler task ──────────────► on success: report, then write back
//!    │                       │
//!    ▼                       ▼
//!  select! { result ─► Original | Failed,  timer ─► TimedOut }
//! ```
//!
//! The handler runs on the shared [`TaskTracker`] so losing the race to the
//! timer does not cancel it. A result that arrives after the caller was
//! released is still cached, and a retry with the same key replays it.
//!
//! Two first-time requests with the same key may both miss and both run the
//! handler; the last cache write wins. This is not a single-flight lock.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::key::IdempotencyKey;
use super::status::CacheStatus;
use crate::cache::CacheStore;
use crate::metrics;

/// A handler result the deduplicator can write to the cache.
///
/// The value itself goes back to the first caller; only [`cache_body`]
/// is stored and replayed on later hits.
///
/// [`cache_body`]: Cacheable::cache_body
pub trait Cacheable: Send + 'static {
    /// Text stored in the cache entry.
    fn cache_body(&self) -> &str;
}

impl Cacheable for String {
    fn cache_body(&self) -> &str {
        self
    }
}

/// How an idempotent invocation was settled for the caller.
#[derive(Debug)]
pub enum Outcome<V, E> {
    /// Replayed from the cache entry, verbatim.
    FromCache(String),
    /// Produced by the handler within the bounded wait.
    Original(V),
    /// The wait elapsed first; the handler is still running.
    TimedOut,
    /// The handler failed before the wait elapsed. Never cached.
    Failed(E),
    /// The handler task ended without reporting (it panicked).
    Aborted,
}

impl<V, E> Outcome<V, E> {
    /// Status to annotate the response with.
    pub fn cache_status(&self) -> CacheStatus {
        match self {
            Self::FromCache(_) => CacheStatus::FromCache,
            Self::Original(_) => CacheStatus::Original,
            Self::TimedOut => CacheStatus::TimedOut,
            Self::Failed(_) | Self::Aborted => CacheStatus::None,
        }
    }
}

/// Gates idempotent handler invocations behind a response cache.
#[derive(Clone)]
pub struct Deduplicator {
    cache: Arc<dyn CacheStore>,
    wait: Duration,
    ttl: Duration,
    tracker: TaskTracker,
}

impl Deduplicator {
    /// Create a deduplicator.
    ///
    /// * `wait` - how long a caller waits for the handler before `TimedOut`
    /// * `ttl` - lifetime of written cache entries
    /// * `tracker` - owns detached handler tasks so shutdown can drain them
    pub fn new(
        cache: Arc<dyn CacheStore>,
        wait: Duration,
        ttl: Duration,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            cache,
            wait,
            ttl,
            tracker,
        }
    }

    /// Read the cache entry for `key`. Store errors count as a miss.
    pub async fn lookup(&self, key: &IdempotencyKey) -> Option<String> {
        match self.cache.get(&key.cache_key()).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Idempotency cache read failed, treating as miss");
                metrics::record_cache_error("read");
                None
            }
        }
    }

    /// Settle an idempotent invocation.
    ///
    /// `handler` yields a [`Cacheable`] value on success, or an error that
    /// is handed back to the caller unchanged.
    pub async fn execute<F, V, E>(&self, key: &IdempotencyKey, handler: F) -> Outcome<V, E>
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
        V: Cacheable,
        E: Send + 'static,
    {
        if let Some(cached) = self.lookup(key).await {
            debug!(key = %key, "Replaying cached response");
            return Outcome::FromCache(cached);
        }

        // The receiver is the settle guard: once the timer wins it is dropped
        // and the handler task's send fails instead of reaching the caller.
        let (tx, rx) = oneshot::channel::<Result<V, E>>();
        let cache = Arc::clone(&self.cache);
        let cache_key = key.cache_key();
        let ttl = self.ttl;

        self.tracker.spawn(async move {
            match handler.await {
                Ok(value) => {
                    let body = value.cache_body().to_string();
                    if tx.send(Ok(value)).is_err() {
                        debug!(key = %cache_key, "Handler finished after caller was released");
                        metrics::record_late_completion();
                    }
                    // The caller is already released; the write is best-effort
                    write_back(cache.as_ref(), &cache_key, &body, ttl).await;
                }
                Err(err) => {
                    // Failures are only reported, never cached
                    let _ = tx.send(Err(err));
                }
            }
        });

        tokio::select! {
            biased;
            settled = rx => match settled {
                Ok(Ok(value)) => Outcome::Original(value),
                Ok(Err(err)) => Outcome::Failed(err),
                Err(_) => {
                    warn!(key = %key, "Handler task ended without a result");
                    Outcome::Aborted
                }
            },
            () = tokio::time::sleep(self.wait) => {
                debug!(key = %key, wait_ms = self.wait.as_millis() as u64, "Bounded wait elapsed");
                Outcome::TimedOut
            }
        }
    }
}

/// Best-effort cache write. Failures are logged and swallowed.
async fn write_back(cache: &dyn CacheStore, cache_key: &str, value: &str, ttl: Duration) {
    match cache.set(cache_key, value, ttl).await {
        Ok(()) => debug!(key = cache_key, "Cached idempotent response"),
        Err(e) => {
            warn!(key = cache_key, error = %e, "Idempotency cache write failed");
            metrics::record_cache_error("write");
        }
    }
}
