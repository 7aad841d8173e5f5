//! Dotted-path resolution over JSON payloads.
//!
//! Entity ids are extracted from event payloads and workflow inputs via paths
//! like `$.detail.car.id`. The leading `$.` is optional; segments are split on
//! `.` and resolved against object keys (array indexing is not supported --
//! correlation ids live in object fields).

use serde_json::Value;

/// Resolve a dotted path against a JSON value.
///
/// Returns `None` if any segment is missing or traverses a non-object.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let trimmed = path.strip_prefix("$.").unwrap_or(path);
    if trimmed.is_empty() {
        return None;
    }
    let mut current = value;
    for segment in trimmed.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Resolve a dotted path to a string value.
///
/// Returns `None` if the path does not resolve or the target is not a JSON
/// string.
pub fn resolve_string(value: &Value, path: &str) -> Option<String> {
    resolve(value, path)
        .and_then(Value::as_str)
        .map(str::to_string)
}
