//! Credential scrubbing for structured log fields.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Replacement written in place of a scrubbed value.
pub const REDACTED: &str = "[REDACTED]";

const DENYLIST_KEYS: [&str; 8] = [
    "token",
    "authorization",
    "cookie",
    "password",
    "secret",
    "private_key",
    "oauth_state",
    "client_secret",
];

/// Scrub every field of a log event in place.
pub fn redact_fields(fields: &mut BTreeMap<String, Value>) {
    for (key, value) in fields.iter_mut() {
        *value = redact_value(key, value);
    }
}

/// Scrub one value, recursing into objects and arrays.
pub fn redact_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) if looks_like_credential(s) => Value::String(REDACTED.to_string()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), redact_value(k, v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_value(key, v)).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

fn looks_like_credential(raw: &str) -> bool {
    let trimmed = raw.trim_matches('"');
    if trimmed.to_ascii_lowercase().starts_with("bearer ") {
        return true;
    }
    // JWT: three dot-separated base64url segments.
    trimmed.len() > 40
        && trimmed.matches('.').count() == 2
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}
