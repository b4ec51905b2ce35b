//! Shared application state for Axum handlers and middleware.
//!
//! Cloned per request; every component is either `Arc`-backed or cheap to
//! clone.
//!
//! # Structured Concurrency
//!
//! Handlers of idempotent routes run as detached tasks on a
//! `tokio_util::task::TaskTracker` so a timed-out caller does not cancel
//! them. Call [`AppState::shutdown`] after the server stops so in-flight
//! handlers finish and write their results back before exit.

use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::info;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::idempotency::{Deduplicator, RouteTable};
use crate::logging::{LogSink, RequestLogger, TracingSink};
use crate::routes::route_table;
use crate::services::SampleService;

/// Shared application state.
///
/// # Lifecycle
///
/// ```rust,ignore
/// let state = AppState::new(config, cache);
/// // ... serve ...
/// state.shutdown().await;  // Drain detached handler tasks
/// ```
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Response cache backing the deduplicator
    pub cache: Arc<dyn CacheStore>,
    pub deduplicator: Deduplicator,
    pub logger: RequestLogger,
    /// Routes the deduplicator applies to
    pub routes: Arc<RouteTable>,
    pub sample: SampleService,
    /// Tracks detached handler tasks for graceful shutdown
    task_tracker: TaskTracker,
}

impl AppState {
    /// Create application state that logs through `tracing`.
    pub fn new(config: Config, cache: Arc<dyn CacheStore>) -> Self {
        Self::with_log_sink(config, cache, Arc::new(TracingSink))
    }

    /// Create application state with a custom log sink.
    pub fn with_log_sink(
        config: Config,
        cache: Arc<dyn CacheStore>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let task_tracker = TaskTracker::new();
        let deduplicator = Deduplicator::new(
            Arc::clone(&cache),
            config.idempotency_wait,
            config.cache_ttl,
            task_tracker.clone(),
        );
        let logger = RequestLogger::new(sink, config.log_watchdog);
        let sample = SampleService::new(config.sample_delay);

        Self {
            config: Arc::new(config),
            cache,
            deduplicator,
            logger,
            routes: Arc::new(route_table()),
            sample,
            task_tracker,
        }
    }

    /// Close the task tracker and wait for detached handler tasks to finish.
    pub async fn shutdown(&self) {
        info!(
            in_flight = self.task_tracker.len(),
            "Draining in-flight idempotent handlers"
        );

        self.task_tracker.close();
        self.task_tracker.wait().await;

        info!("All handler tasks have completed");
    }
}
