use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Severity of an emitted request log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Request metadata captured once when a request enters the logger.
///
/// Serialized with the field names downstream log pipelines index on, then
/// sanitized before it is attached to any [`LogEntry`].
#[derive(Debug, Clone, Serialize)]
pub struct LogContext {
    pub remote_addr: Option<String>,
    pub hostname: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub workspace: String,
    #[serde(rename = "workspaceEnv")]
    pub workspace_env: String,
    pub store: Option<String>,
    pub channel: Option<String>,
    #[serde(rename = "jwtEmail")]
    pub jwt_email: Option<String>,
    #[serde(rename = "processingTimeMs")]
    pub processing_time_ms: u64,
    #[serde(rename = "cacheStatus")]
    pub cache_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(rename = "traceId")]
    pub trace_id: Option<String>,
}

/// Error details attached to a failed request's terminal log.
#[derive(Debug, Clone, Serialize)]
pub struct LogTrace {
    pub error: String,
    #[serde(rename = "traceId")]
    pub trace_id: Option<String>,
}

/// One emitted request log line. Immutable once emitted.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub context: Value,
    pub level: LogLevel,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "processingTimeMs", skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(rename = "cacheStatus", skip_serializing_if = "Option::is_none")]
    pub cache_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<LogTrace>,
}

impl LogEntry {
    /// Start an entry with the given message, level and single tag.
    pub fn new(
        message: impl Into<String>,
        level: LogLevel,
        tag: impl Into<String>,
        context: Value,
    ) -> Self {
        Self {
            message: message.into(),
            context,
            level,
            tags: vec![tag.into()],
            timestamp: Utc::now(),
            processing_time_ms: None,
            cache_status: None,
            trace: None,
        }
    }

    /// Record timing and the final cache status on a terminal entry.
    pub fn with_outcome(
        mut self,
        processing_time_ms: u64,
        cache_status: impl Into<String>,
    ) -> Self {
        self.processing_time_ms = Some(processing_time_ms);
        self.cache_status = Some(cache_status.into());
        self
    }

    pub fn with_trace(mut self, trace: LogTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// First tag, which carries the outcome of the request.
    pub fn tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}
