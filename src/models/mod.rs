mod api;
mod envelope;
mod log_entry;

pub use api::{EchoData, FailureData, HealthResponse, PingData, ThirdPartyData};
pub use envelope::{ApiResponse, EnvelopeStatus};
pub use log_entry::{LogContext, LogEntry, LogLevel, LogTrace};
