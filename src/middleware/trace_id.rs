//! Trace-ID propagation from the upstream proxy.
//!
//! # Behavior
//!
//! - Reads `x-tracing-id` from the incoming request (empty if absent)
//! - Stores it as a [`TraceId`] request extension for the logger and handlers
//! - Records it on the current span and logs its receipt
//!
//! No ID is generated when the header is missing and the value is not
//! validated: trace IDs originate at the proxy and are passed through as-is.
//!
//! ```bash
//! curl -H "x-tracing-id: 4bf92f3577b34da6" http://localhost:3000/sample/ping
//! ```

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::{Span, info};

/// Header carrying the upstream trace ID.
pub const TRACING_ID_HEADER: &str = "x-tracing-id";

/// Trace ID received from upstream; empty when none was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trace propagation layer for Tower middleware stack.
#[derive(Clone, Default)]
pub struct TraceIdLayer;

impl TraceIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TraceIdLayer {
    type Service = TraceIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceIdService { inner }
    }
}

/// Trace propagation service wrapper.
#[derive(Clone)]
pub struct TraceIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TraceIdService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let trace_id = extract_trace_id(&req);

        Span::current().record("trace_id", trace_id.as_str());
        info!(trace_id = %trace_id.as_str(), "Tracing ID received from upstream proxy");

        req.extensions_mut().insert(trace_id);

        // Swap in the readied clone so the service that was polled is the one called
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move { inner.call(req).await })
    }
}

/// Read the trace ID header, defaulting to empty.
fn extract_trace_id<B>(req: &Request<B>) -> TraceId {
    let value = req
        .headers()
        .get(TRACING_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    TraceId(value.to_string())
}

/// Extension trait to read the propagated trace ID from requests.
pub trait TraceIdExt {
    /// The trace ID attached by [`TraceIdLayer`], if the layer ran.
    fn trace_id(&self) -> Option<&TraceId>;
}

impl<B> TraceIdExt for Request<B> {
    fn trace_id(&self) -> Option<&TraceId> {
        self.extensions().get::<TraceId>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::convert::Infallible;

    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_extract_existing_trace_id() {
        let req = Request::builder()
            .header("x-tracing-id", "abc-123")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_trace_id(&req), TraceId("abc-123".to_string()));
    }

    #[test]
    fn test_missing_trace_id_is_empty_not_generated() {
        let req = Request::builder().body(Body::empty()).unwrap();

        let trace_id = extract_trace_id(&req);
        assert!(trace_id.is_empty());
    }

    #[test]
    fn test_trace_id_is_not_validated() {
        let req = Request::builder()
            .header("x-tracing-id", "not a uuid at all")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_trace_id(&req).as_str(), "not a uuid at all");
    }

    #[tokio::test]
    async fn test_layer_attaches_extension() {
        let service = TraceIdLayer::new().layer(tower::service_fn(
            |req: Request<Body>| async move {
                let seen = req.trace_id().cloned().unwrap_or_default();
                Ok::<_, Infallible>(Response::new(Body::from(seen.0)))
            },
        ));

        let req = Request::builder()
            .header("x-tracing-id", "trace-xyz")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"trace-xyz");
    }
}
