//! Structured request logging.
//!
//! Each request gets exactly one entry log and exactly one terminal log
//! (success or error). A watchdog adds a `Timeout` warning when a request is
//! still running after the configured bound; it never alters the response
//! or replaces the terminal log.
//!
//! Contexts are sanitized with [`sanitize`] on every emission, so sensitive
//! keys never reach the sink.

mod sanitize;
mod sink;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::metrics;
use crate::models::{EnvelopeStatus, LogContext, LogEntry, LogLevel, LogTrace};

pub use sanitize::{REDACTED, SENSITIVE_KEYS, sanitize};
pub use sink::{LogSink, MemorySink, TracingSink};

/// Emits request logs into a [`LogSink`].
#[derive(Clone)]
pub struct RequestLogger {
    sink: Arc<dyn LogSink>,
    watchdog: Duration,
}

impl RequestLogger {
    pub fn new(sink: Arc<dyn LogSink>, watchdog: Duration) -> Self {
        Self { sink, watchdog }
    }

    /// Start timing a request and emit its entry log.
    pub fn begin(&self, context: LogContext) -> RequestScope<'_> {
        let scope = RequestScope {
            logger: self,
            context,
            started: Instant::now(),
            timed_out: false,
        };
        scope.emit(LogEntry::new(
            "Request",
            LogLevel::Info,
            "REQUEST",
            scope.sanitized_context(),
        ));
        scope
    }
}

/// One in-flight request between its entry and terminal logs.
pub struct RequestScope<'a> {
    logger: &'a RequestLogger,
    context: LogContext,
    started: Instant,
    timed_out: bool,
}

impl RequestScope<'_> {
    /// Drive `operation` to completion, warning once if it outlives the watchdog.
    pub async fn watch<F: Future>(&mut self, operation: F) -> F::Output {
        tokio::pin!(operation);

        let first = tokio::time::timeout(self.logger.watchdog, &mut operation).await;
        match first {
            Ok(output) => output,
            Err(_) => {
                self.timed_out = true;
                self.emit(LogEntry::new(
                    "Timeout",
                    LogLevel::Warn,
                    EnvelopeStatus::TimedOut.as_str(),
                    self.sanitized_context(),
                ));
                operation.await
            }
        }
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Emit the terminal log for a completed request.
    ///
    /// `envelope_status` is the `status` field of the response body, if any.
    /// `cache_status` is read by the caller at completion time.
    pub fn finish(mut self, cache_status: &str, envelope_status: Option<&str>) {
        let elapsed = self.record_outcome(cache_status);

        let tag = match envelope_status {
            Some(status) => status.to_string(),
            None if self.timed_out => EnvelopeStatus::TimedOut.as_str().to_string(),
            None => EnvelopeStatus::Success.as_str().to_string(),
        };
        let (message, level) = if self.timed_out {
            ("Exit after timeout", LogLevel::Warn)
        } else {
            ("Response", LogLevel::Info)
        };

        self.record_duration(&tag);
        self.emit(
            LogEntry::new(message, level, tag, self.sanitized_context())
                .with_outcome(elapsed, cache_status),
        );
    }

    /// Emit the terminal log for a failed request.
    pub fn fail(mut self, cache_status: &str, error: &str) {
        let elapsed = self.record_outcome(cache_status);
        let tag = EnvelopeStatus::Failed.as_str();

        self.record_duration(tag);
        self.emit(
            LogEntry::new("Error", LogLevel::Error, tag, self.sanitized_context())
                .with_outcome(elapsed, cache_status)
                .with_trace(LogTrace {
                    error: error.to_string(),
                    trace_id: self.context.trace_id.clone(),
                }),
        );
    }

    fn record_outcome(&mut self, cache_status: &str) -> u64 {
        let elapsed = self.started.elapsed().as_millis() as u64;
        self.context.processing_time_ms = elapsed;
        self.context.cache_status = cache_status.to_string();
        elapsed
    }

    fn record_duration(&self, tag: &str) {
        metrics::record_request_duration(
            self.context.method.as_deref().unwrap_or_default(),
            tag,
            self.started.elapsed().as_secs_f64(),
        );
    }

    fn sanitized_context(&self) -> Value {
        serde_json::to_value(&self.context)
            .map(|value| sanitize(&value))
            .unwrap_or(Value::Null)
    }

    fn emit(&self, entry: LogEntry) {
        self.logger.sink.emit(&entry);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn context() -> LogContext {
        LogContext {
            remote_addr: Some("10.0.0.1".to_string()),
            hostname: Some("api.local".to_string()),
            method: Some("POST".to_string()),
            url: Some("/sample/echo".to_string()),
            referrer: None,
            user_agent: Some("curl/8".to_string()),
            workspace: "acme".to_string(),
            workspace_env: String::new(),
            store: None,
            channel: None,
            jwt_email: None,
            processing_time_ms: 0,
            cache_status: "None".to_string(),
            details: Some(json!({"body": {"token": "secret", "name": "ada"}})),
            trace_id: Some("trace-1".to_string()),
        }
    }

    fn logger(watchdog: Duration) -> (RequestLogger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (RequestLogger::new(sink.clone(), watchdog), sink)
    }

    #[tokio::test]
    async fn test_entry_and_terminal_logs() {
        let (logger, sink) = logger(Duration::from_secs(5));

        let mut scope = logger.begin(context());
        scope.watch(async {}).await;
        scope.finish("Original", Some("FAILED"));

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Request");
        assert_eq!(entries[0].tag(), Some("REQUEST"));
        assert_eq!(entries[1].message, "Response");
        assert_eq!(entries[1].tag(), Some("FAILED"));
        assert_eq!(entries[1].cache_status.as_deref(), Some("Original"));
        assert_eq!(entries[1].context["cacheStatus"], "Original");
        assert!(entries[1].processing_time_ms.is_some());
    }

    #[tokio::test]
    async fn test_body_is_redacted_in_every_entry() {
        let (logger, sink) = logger(Duration::from_secs(5));

        let scope = logger.begin(context());
        scope.fail("None", "boom");

        for entry in sink.entries() {
            let line = serde_json::to_string(&entry).unwrap();
            assert!(!line.contains("secret"), "leaked: {line}");
            assert_eq!(entry.context["details"]["body"]["token"], REDACTED);
        }
    }

    #[tokio::test]
    async fn test_error_log_carries_trace() {
        let (logger, sink) = logger(Duration::from_secs(5));

        logger.begin(context()).fail("TimedOut", "handler exploded");

        let entries = sink.entries();
        let terminal = entries.last().unwrap();
        assert_eq!(terminal.level, LogLevel::Error);
        assert_eq!(terminal.tag(), Some("FAILED"));
        let trace = terminal.trace.as_ref().unwrap();
        assert_eq!(trace.error, "handler exploded");
        assert_eq!(trace.trace_id.as_deref(), Some("trace-1"));
    }

    #[tokio::test]
    async fn test_watchdog_warns_without_altering_result() {
        let (logger, sink) = logger(Duration::from_millis(50));

        let mut scope = logger.begin(context());
        let value = scope
            .watch(async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                7
            })
            .await;
        assert_eq!(value, 7);
        assert!(scope.timed_out());
        scope.finish("None", None);

        let entries = sink.entries();
        let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["Request", "Timeout", "Exit after timeout"]);
        assert_eq!(entries[1].level, LogLevel::Warn);
        assert_eq!(entries[2].tag(), Some("TIMEDOUT"));
    }

    #[tokio::test]
    async fn test_envelope_status_wins_over_watchdog_tag() {
        let (logger, sink) = logger(Duration::from_millis(10));

        let mut scope = logger.begin(context());
        scope
            .watch(tokio::time::sleep(Duration::from_millis(60)))
            .await;
        scope.finish("Original", Some("SUCCESS"));

        let entries = sink.entries();
        assert_eq!(entries.last().unwrap().tag(), Some("SUCCESS"));
        assert_eq!(entries.last().unwrap().level, LogLevel::Warn);
    }

    #[tokio::test]
    async fn test_fast_request_never_warns() {
        let (logger, sink) = logger(Duration::from_millis(200));

        let mut scope = logger.begin(context());
        scope.watch(async {}).await;
        scope.finish("None", None);

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].tag(), Some("SUCCESS"));
    }
}
