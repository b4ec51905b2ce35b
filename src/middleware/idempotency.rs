//! Idempotency middleware.
//!
//! Applies the [`Deduplicator`](crate::idempotency::Deduplicator) to routes
//! registered in the [`RouteTable`](crate::idempotency::RouteTable); every
//! other route passes straight through.
//!
//! # Response Headers
//!
//! - `x-idempotency-key`: the key the request was settled under
//! - `x-idempotency-status`: `FromCache`, `Original` or `TimedOut`
//!
//! Failed handler responses are returned exactly as produced, without
//! either header, and are never cached.
//!
//! ```bash
//! curl -X POST -H "x-idempotency-key: order-42" \
//!      -d '{"sku":"A1"}' http://localhost:3000/sample/echo
//! ```

use axum::body::Body;
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::response::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, warn};

use super::body::{buffer_request, buffer_response};
use super::ip::client_ip;
use crate::error::{AppError, is_failure};
use crate::idempotency::{
    CacheStatus, Cacheable, Fingerprint, IDEMPOTENCY_KEY_HEADER, IDEMPOTENCY_STATUS_HEADER,
    IdempotencyKey, Outcome, TIMED_OUT_MESSAGE,
};
use crate::metrics;
use crate::models::ApiResponse;
use crate::state::AppState;

/// Middleware deduplicating idempotent routes through the response cache.
pub async fn deduplicate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let idempotent = req
        .extensions()
        .get::<MatchedPath>()
        .is_some_and(|path| state.routes.is_idempotent(req.method(), path.as_str()));
    if !idempotent {
        return next.run(req).await;
    }

    let limit = state.config.max_request_body_size;
    let ip = client_ip(&req);
    let (mut req, body) = match buffer_request(req, limit).await {
        Ok(buffered) => buffered,
        Err(e) => return e.into_response(),
    };

    let key = IdempotencyKey::from_headers(req.headers()).unwrap_or_else(|| {
        let url = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
        Fingerprint::new(&ip, url, &body, req.headers()).derive_key()
    });
    debug!(key = %key, "Resolved idempotency key");

    // Handlers see the resolved key whether or not the client sent one
    if let Ok(value) = HeaderValue::from_str(key.as_str()) {
        req.headers_mut().insert(IDEMPOTENCY_KEY_HEADER, value);
    }
    req.extensions_mut().insert(key.clone());

    let outcome = state
        .deduplicator
        .execute(&key, async move { cacheable(next.run(req).await, limit).await })
        .await;
    let status = outcome.cache_status();

    let mut response = match outcome {
        Outcome::FromCache(body) => json_response(body),
        Outcome::Original(produced) => produced.into_response(),
        Outcome::TimedOut => {
            ApiResponse::timed_out(json!({ "error": "Request timed out" }), TIMED_OUT_MESSAGE)
                .into_response()
        }
        Outcome::Failed(response) => return response,
        Outcome::Aborted => {
            warn!(key = %key, "Idempotent handler ended without a result");
            return AppError::Internal("Request handler aborted".to_string()).into_response();
        }
    };

    metrics::record_idempotency_outcome(status.as_str());
    annotate(&mut response, &key, status);
    response
}

/// A successful handler response, buffered so its body can be cached.
///
/// The first caller gets the handler's own status and headers back; replays
/// are rebuilt from the body alone.
#[derive(Debug)]
struct Produced {
    parts: Parts,
    body: String,
}

impl Cacheable for Produced {
    fn cache_body(&self) -> &str {
        &self.body
    }
}

impl IntoResponse for Produced {
    fn into_response(self) -> Response {
        Response::from_parts(self.parts, Body::from(self.body))
    }
}

/// Buffer a handler response for caching.
///
/// Failed responses (see [`is_failure`]) are handed back as errors so they
/// reach the client untouched.
async fn cacheable(response: Response, limit: usize) -> Result<Produced, Response> {
    if is_failure(&response) {
        return Err(response);
    }

    let (parts, bytes) = buffer_response(response, limit)
        .await
        .map_err(IntoResponse::into_response)?;

    let body = String::from_utf8(bytes.to_vec()).map_err(|_| {
        AppError::Internal("Handler produced a non UTF-8 body".to_string()).into_response()
    })?;
    Ok(Produced { parts, body })
}

fn json_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        Body::from(body),
    )
        .into_response()
}

fn annotate(response: &mut Response, key: &IdempotencyKey, status: CacheStatus) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(key.as_str()) {
        headers.insert(IDEMPOTENCY_KEY_HEADER, value);
    }
    headers.insert(
        IDEMPOTENCY_STATUS_HEADER,
        HeaderValue::from_static(status.as_str()),
    );
}
