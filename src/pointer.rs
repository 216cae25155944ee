//! JSON Pointer (RFC 6901) navigation of URL fragments.

use serde_json::Value;

use crate::error::PointerError;
use crate::locator::percent_decode;
use crate::types::json_type_name;

/// Navigate a JSON Pointer fragment (e.g. `"#/definitions/foo"` or `"/items/0"`).
///
/// The fragment may carry a leading `#` and may still be percent-encoded as
/// it appears in a URL. An empty pointer selects the whole document.
/// Object members are looked up by key and arrays by decimal index.
///
/// # Errors
///
/// Returns `PointerError` naming the first segment that cannot be followed.
pub fn navigate_pointer<'a>(
    document: &'a Value,
    fragment: &str,
) -> Result<&'a Value, PointerError> {
    let pointer = percent_decode(fragment.strip_prefix('#').unwrap_or(fragment));
    if pointer.is_empty() {
        return Ok(document);
    }

    let Some(path) = pointer.strip_prefix('/') else {
        return Err(PointerError {
            pointer: pointer.clone(),
            segment: pointer.clone(),
            reason: "is not a JSON Pointer (must start with '/')".to_string(),
        });
    };

    let mut current = document;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        let next = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(items) => parse_index(&key).and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| PointerError {
            pointer: pointer.clone(),
            segment: key.clone(),
            reason: match current {
                Value::Object(_) => "does not exist".to_string(),
                Value::Array(items) => format!("is not an index below {}", items.len()),
                other => format!("cannot index into {}", json_type_name(other)),
            },
        })?;
    }
    Ok(current)
}

/// Array indices are plain decimals without leading zeros.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
