//! Request logging middleware.
//!
//! Wraps every request in a [`RequestScope`](crate::logging::RequestScope):
//! an entry log when the request arrives, a watchdog warning if it runs
//! past `LOG_WATCHDOG_MS`, and one terminal log when it completes.
//!
//! The terminal log reads `x-idempotency-status` from the response at
//! completion time, so it reports the status the deduplicator settled on
//! rather than whatever was known when the request arrived.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_TYPE, HOST, REFERER, USER_AGENT};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use super::body::{buffer_request, buffer_response};
use super::ip::client_ip;
use super::trace_id::{TRACING_ID_HEADER, TraceIdExt};
use crate::error::{failure_message, is_failure};
use crate::idempotency::{CacheStatus, IDEMPOTENCY_STATUS_HEADER};
use crate::models::LogContext;
use crate::state::AppState;

/// Middleware emitting structured, sanitized request logs.
pub async fn log_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let limit = state.config.max_request_body_size;
    let mut context = capture_context(&req);
    let request_status = header_str(req.headers(), IDEMPOTENCY_STATUS_HEADER).map(str::to_string);

    let (req, body) = match buffer_request(req, limit).await {
        Ok(buffered) => buffered,
        Err(e) => {
            let response = e.into_response();
            let cache_status = resolve_cache_status(&response, request_status.as_deref());
            state
                .logger
                .begin(context)
                .fail(&cache_status, &failure_message(&response));
            return response;
        }
    };
    context.details = Some(json!({ "body": body_value(&body) }));

    let mut scope = state.logger.begin(context);
    let response = scope.watch(next.run(req)).await;
    let cache_status = resolve_cache_status(&response, request_status.as_deref());

    if is_failure(&response) {
        scope.fail(&cache_status, &failure_message(&response));
        return response;
    }

    if !is_json(response.headers()) {
        scope.finish(&cache_status, None);
        return response;
    }

    match buffer_response(response, limit).await {
        Ok((parts, bytes)) => {
            scope.finish(&cache_status, envelope_status(&bytes).as_deref());
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            let response = e.into_response();
            scope.fail(&cache_status, &failure_message(&response));
            response
        }
    }
}

/// Snapshot the request metadata the logs carry.
fn capture_context(req: &Request) -> LogContext {
    let headers = req.headers();
    let owned = |name: &str| header_str(headers, name).map(str::to_string);

    let trace_id = req
        .trace_id()
        .map(|t| t.as_str().to_string())
        .or_else(|| owned(TRACING_ID_HEADER));

    LogContext {
        remote_addr: Some(client_ip(req)).filter(|ip| !ip.is_empty()),
        hostname: header_str(headers, HOST.as_str())
            .map(|host| host.split(':').next().unwrap_or(host).to_string()),
        method: Some(req.method().to_string()),
        url: req.uri().path_and_query().map(|pq| pq.as_str().to_string()),
        referrer: owned(REFERER.as_str()).or_else(|| owned("referrer")),
        user_agent: owned(USER_AGENT.as_str()),
        workspace: owned("x-workspace").unwrap_or_default(),
        workspace_env: owned("x-workspace-env").unwrap_or_default(),
        store: owned("x-store"),
        channel: owned("x-channel"),
        jwt_email: owned("x-jwt-email"),
        processing_time_ms: 0,
        cache_status: header_str(headers, IDEMPOTENCY_STATUS_HEADER)
            .unwrap_or(CacheStatus::None.as_str())
            .to_string(),
        details: None,
        trace_id,
    }
}

/// Response header, then request header, then `None`.
fn resolve_cache_status(response: &Response, request_status: Option<&str>) -> String {
    header_str(response.headers(), IDEMPOTENCY_STATUS_HEADER)
        .or(request_status)
        .unwrap_or(CacheStatus::None.as_str())
        .to_string()
}

/// Request body as logged: JSON when it parses, text otherwise, null when empty.
fn body_value(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// `status` field of a JSON response envelope, if present.
fn envelope_status(body: &Bytes) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get("status")?
        .as_str()
        .map(str::to_string)
}

fn is_json(headers: &HeaderMap) -> bool {
    header_str(headers, CONTENT_TYPE.as_str()).is_some_and(|ct| ct.starts_with("application/json"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::middleware::trace_id::TraceId;

    #[test]
    fn test_capture_context_reads_headers() {
        let mut req = Request::builder()
            .method("POST")
            .uri("/sample/echo?x=1")
            .header("host", "api.example.com:8443")
            .header("referer", "https://app.example.com")
            .header("user-agent", "curl/8")
            .header("x-workspace", "acme")
            .header("x-channel", "web")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(TraceId("trace-7".to_string()));

        let context = capture_context(&req);
        assert_eq!(context.hostname.as_deref(), Some("api.example.com"));
        assert_eq!(context.method.as_deref(), Some("POST"));
        assert_eq!(context.url.as_deref(), Some("/sample/echo?x=1"));
        assert_eq!(context.referrer.as_deref(), Some("https://app.example.com"));
        assert_eq!(context.workspace, "acme");
        assert_eq!(context.workspace_env, "");
        assert_eq!(context.channel.as_deref(), Some("web"));
        assert_eq!(context.remote_addr.as_deref(), Some("203.0.113.9"));
        assert_eq!(context.trace_id.as_deref(), Some("trace-7"));
        assert_eq!(context.cache_status, "None");
    }

    #[test]
    fn test_cache_status_prefers_response_header() {
        let mut response = Response::new(Body::empty());
        response
            .headers_mut()
            .insert(IDEMPOTENCY_STATUS_HEADER, HeaderValue::from_static("FromCache"));

        assert_eq!(resolve_cache_status(&response, Some("Original")), "FromCache");
    }

    #[test]
    fn test_cache_status_falls_back() {
        let response = Response::new(Body::empty());

        assert_eq!(resolve_cache_status(&response, Some("TimedOut")), "TimedOut");
        assert_eq!(resolve_cache_status(&response, None), "None");
    }

    #[test]
    fn test_body_value_variants() {
        assert_eq!(body_value(&Bytes::new()), Value::Null);
        assert_eq!(body_value(&Bytes::from_static(b"{\"a\":1}")), json!({"a": 1}));
        assert_eq!(body_value(&Bytes::from_static(b"hello")), json!("hello"));
    }

    #[test]
    fn test_envelope_status() {
        let body = Bytes::from_static(br#"{"status":"FAILED","data":{}}"#);
        assert_eq!(envelope_status(&body).as_deref(), Some("FAILED"));
        assert_eq!(envelope_status(&Bytes::from_static(b"[1,2]")), None);
    }
}
