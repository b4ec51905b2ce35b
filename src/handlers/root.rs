use tracing::instrument;

use crate::models::ApiResponse;

/// `GET /`: greeting envelope.
///
/// Registered idempotent, so repeat calls from the same client replay the
/// first response (timestamp included) as `FromCache`.
#[instrument]
pub async fn hello() -> ApiResponse<String> {
    ApiResponse::success("Hello World!".to_string())
}
