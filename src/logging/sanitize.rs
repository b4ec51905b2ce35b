use serde_json::Value;

/// Keys whose values never reach a log line. Matched case-sensitively.
pub const SENSITIVE_KEYS: [&str; 6] = [
    "authorization",
    "x-api-key",
    "api-key",
    "cookie",
    "set-cookie",
    "token",
];

/// Replacement for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Return a copy of `value` with every sensitive key's value redacted,
/// at any depth of nested objects and arrays.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let inner = if SENSITIVE_KEYS.contains(&key.as_str()) {
                        Value::String(REDACTED.to_string())
                    } else {
                        sanitize(inner)
                    };
                    (key.clone(), inner)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}
