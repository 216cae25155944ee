//! Shared constants and small helpers.

use std::time::Duration;

use serde_json::Value;

/// Member name that turns an object into a reference marker.
pub const REF_KEY: &str = "$ref";

/// Default ceiling on nested reference expansion.
pub const DEFAULT_MAX_RECURSIONS: usize = 20;

/// Default timeout for HTTP fetches (5 seconds).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns the reference string if `value` is a reference marker.
///
/// A marker is an object carrying a string `$ref` member. Sibling members
/// are ignored; an object whose `$ref` is not a string is plain data.
pub fn as_reference(value: &Value) -> Option<&str> {
    value.as_object()?.get(REF_KEY)?.as_str()
}
