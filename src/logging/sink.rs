use std::sync::{Mutex, PoisonError};

use tracing::{error, info, warn};

use crate::models::{LogEntry, LogLevel};

/// Destination for request log entries.
pub trait LogSink: Send + Sync {
    fn emit(&self, entry: &LogEntry);
}

/// Emits each entry as one JSON line through `tracing`, under target
/// `request_log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, message = %entry.message, "Failed to serialize request log");
                return;
            }
        };

        match entry.level {
            LogLevel::Info => info!(target: "request_log", "{line}"),
            LogLevel::Warn => warn!(target: "request_log", "{line}"),
            LogLevel::Error => error!(target: "request_log", "{line}"),
        }
    }
}

/// Keeps entries in memory. Used to inspect what the logger emitted.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: &LogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
    }
}
