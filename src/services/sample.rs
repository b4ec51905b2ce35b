use std::time::Duration;

use tracing::{debug, instrument};

use crate::models::{ApiResponse, ThirdPartyData};

/// Message and payload text of the simulated downstream call.
pub const THIRD_PARTY_RESPONSE: &str = "Third-party API response";

/// Stand-in for a slow downstream dependency.
///
/// With the default `SAMPLE_DELAY_MS` of 5 s it outlasts the 2 s
/// idempotency wait, which exercises the timeout-then-replay path.
#[derive(Debug, Clone)]
pub struct SampleService {
    delay: Duration,
}

impl SampleService {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the configured delay, then succeed.
    #[instrument(skip(self), fields(delay_ms = self.delay.as_millis() as u64))]
    pub async fn simulate_third_party_call(&self) -> ApiResponse<ThirdPartyData> {
        tokio::time::sleep(self.delay).await;
        debug!("Third-party call completed");

        ApiResponse::success(ThirdPartyData {
            result: THIRD_PARTY_RESPONSE.to_string(),
        })
        .with_message(THIRD_PARTY_RESPONSE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::EnvelopeStatus;

    #[tokio::test]
    async fn test_third_party_call_waits_for_delay() {
        let service = SampleService::new(Duration::from_millis(30));
        let started = std::time::Instant::now();

        let response = service.simulate_third_party_call().await;

        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(response.status, EnvelopeStatus::Success);
        assert_eq!(response.message.as_deref(), Some(THIRD_PARTY_RESPONSE));
        assert_eq!(response.data.unwrap().result, THIRD_PARTY_RESPONSE);
    }
}
