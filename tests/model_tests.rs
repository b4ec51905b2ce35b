//! Unit tests for wire models and the values clients and log pipelines see.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;

mod envelope_tests {
    use super::*;
    use idempotency_gateway::models::{ApiResponse, EchoData, EnvelopeStatus, FailureData};

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ApiResponse::success(EchoData {
            echo: json!({ "a": 1 }),
        });

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["data"]["echo"]["a"], 1);
        assert!(value.get("message").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_failed_envelope_shape() {
        let envelope = ApiResponse::failed(
            FailureData {
                error: "Intentional failure for testing".to_string(),
            },
            "Request failed",
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["message"], "Request failed");
    }

    #[test]
    fn test_timed_out_wire_name() {
        let value = serde_json::to_value(EnvelopeStatus::TimedOut).unwrap();
        assert_eq!(value, json!("TIMEDOUT"));

        let parsed: EnvelopeStatus = serde_json::from_value(json!("TIMEDOUT")).unwrap();
        assert_eq!(parsed, EnvelopeStatus::TimedOut);
    }

    #[test]
    fn test_cached_envelope_parses_back() {
        let text = serde_json::to_string(&ApiResponse::success(json!("Hello World!"))).unwrap();

        let parsed: ApiResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.status, EnvelopeStatus::Success);
        assert_eq!(parsed.data, Some(json!("Hello World!")));
    }
}

mod cache_status_tests {
    use idempotency_gateway::idempotency::CacheStatus;

    #[test]
    fn test_header_values() {
        assert_eq!(CacheStatus::Original.to_string(), "Original");
        assert_eq!(CacheStatus::FromCache.to_string(), "FromCache");
        assert_eq!(CacheStatus::TimedOut.to_string(), "TimedOut");
        assert_eq!(CacheStatus::default(), CacheStatus::None);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!("FromCache".parse::<CacheStatus>().unwrap(), CacheStatus::FromCache);
        assert!("fromcache".parse::<CacheStatus>().is_err());
    }
}

mod key_tests {
    use axum::http::{HeaderMap, HeaderValue};
    use idempotency_gateway::idempotency::{Fingerprint, IdempotencyKey};

    #[test]
    fn test_cache_key_prefix() {
        assert_eq!(IdempotencyKey::new("abc").cache_key(), "idempotency:abc");
    }

    #[test]
    fn test_client_key_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert("x-idempotency-key", HeaderValue::from_static("  order-1 "));

        let key = IdempotencyKey::from_headers(&headers).unwrap();
        assert_eq!(key.as_str(), "order-1");
    }

    #[test]
    fn test_blank_client_key_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-idempotency-key", HeaderValue::from_static("   "));

        assert!(IdempotencyKey::from_headers(&headers).is_none());
    }

    #[test]
    fn test_tracing_id_is_part_of_the_fingerprint() {
        let mut first = HeaderMap::new();
        first.insert("x-tracing-id", HeaderValue::from_static("t-1"));
        let mut second = HeaderMap::new();
        second.insert("x-tracing-id", HeaderValue::from_static("t-2"));

        let a = Fingerprint::new("10.0.0.1", "/sample/echo", b"{}", &first).derive_key();
        let b = Fingerprint::new("10.0.0.1", "/sample/echo", b"{}", &second).derive_key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_body_matches_empty_object() {
        let headers = HeaderMap::new();

        let empty = Fingerprint::new("10.0.0.1", "/sample/fail", b"", &headers).derive_key();
        let object = Fingerprint::new("10.0.0.1", "/sample/fail", b"{}", &headers).derive_key();
        assert_eq!(empty, object);
    }
}

mod log_tests {
    use super::*;
    use idempotency_gateway::logging::{REDACTED, sanitize};
    use idempotency_gateway::models::{LogContext, LogEntry, LogLevel};

    fn context() -> LogContext {
        LogContext {
            remote_addr: Some("10.0.0.1".to_string()),
            hostname: Some("api.local".to_string()),
            method: Some("POST".to_string()),
            url: Some("/sample/echo".to_string()),
            referrer: None,
            user_agent: None,
            workspace: "acme".to_string(),
            workspace_env: "prod".to_string(),
            store: None,
            channel: Some("web".to_string()),
            jwt_email: Some("ada@example.com".to_string()),
            processing_time_ms: 12,
            cache_status: "Original".to_string(),
            details: Some(json!({ "body": { "cookie": "c=1" } })),
            trace_id: Some("trace-1".to_string()),
        }
    }

    #[test]
    fn test_context_wire_names() {
        let value = serde_json::to_value(context()).unwrap();

        assert_eq!(value["workspaceEnv"], "prod");
        assert_eq!(value["jwtEmail"], "ada@example.com");
        assert_eq!(value["processingTimeMs"], 12);
        assert_eq!(value["cacheStatus"], "Original");
        assert_eq!(value["traceId"], "trace-1");
    }

    #[test]
    fn test_sanitize_nested_and_leaves_original() {
        let original = serde_json::to_value(context()).unwrap();
        let sanitized = sanitize(&original);

        assert_eq!(sanitized["details"]["body"]["cookie"], REDACTED);
        assert_eq!(original["details"]["body"]["cookie"], "c=1");
    }

    #[test]
    fn test_sanitize_is_case_sensitive() {
        let sanitized = sanitize(&json!({ "Authorization": "x", "authorization": "y" }));

        assert_eq!(sanitized["Authorization"], "x");
        assert_eq!(sanitized["authorization"], REDACTED);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = LogEntry::new("Response", LogLevel::Info, "SUCCESS", json!({}))
            .with_outcome(42, "FromCache");

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["level"], "info");
        assert_eq!(value["tags"], json!(["SUCCESS"]));
        assert_eq!(value["processingTimeMs"], 42);
        assert_eq!(value["cacheStatus"], "FromCache");
        assert!(value.get("trace").is_none());
    }
}
