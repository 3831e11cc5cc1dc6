//! Accessors for untrusted JSON payloads and string trimming limits.
//!
//! Wire payloads are partially malformed as a matter of course: fields carry
//! the wrong JSON type, numbers arrive as strings, strings exceed any sane
//! length. These helpers read defensively and default to `None` instead of
//! failing, so normalization of optional data never errors.

use serde_json::Value;
use std::collections::BTreeMap;

/// Maximum length for exception values and similar single-line strings.
pub const MAX_VALUE_LENGTH: usize = 1024;

/// Maximum length for log messages.
pub const MAX_MESSAGE_LENGTH: usize = 8192;

/// Maximum number of local variables kept per frame.
pub const MAX_FRAME_VARS: usize = 16;

/// Truncates a string to `max_chars` characters, appending `...` when
/// something was cut. Operates on characters, not bytes, so multi-byte
/// input never gets split mid-codepoint.
pub(crate) fn trim_string(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut out: String = input.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Reads a string field, treating empty strings and non-string values as
/// absent.
pub(crate) fn get_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reads a string field and trims it to `max_chars`.
pub(crate) fn get_trimmed_str(raw: &Value, key: &str, max_chars: usize) -> Option<String> {
    get_str(raw, key).map(|s| trim_string(&s, max_chars))
}

/// Reads a boolean field. Only genuine JSON booleans count; truthy strings
/// and numbers stay `None`.
pub(crate) fn get_bool(raw: &Value, key: &str) -> Option<bool> {
    raw.get(key).and_then(Value::as_bool)
}

/// Reads a non-negative integer field, accepting numbers or decimal strings
/// (several SDKs stringify line numbers).
pub(crate) fn get_u64(raw: &Value, key: &str) -> Option<u64> {
    match raw.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a memory address, accepting numbers or `0x`-prefixed hex strings.
/// Addresses are canonicalized to lowercase hex with a `0x` prefix.
pub(crate) fn get_addr(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::Number(n) => n.as_u64().map(|v| format!("0x{v:x}")),
        Value::String(s) => {
            let stripped = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
            u64::from_str_radix(stripped, 16)
                .ok()
                .map(|v| format!("0x{v:x}"))
        }
        _ => None,
    }
}

/// Reads an array of strings, skipping non-string entries.
pub(crate) fn get_str_list(raw: &Value, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Reads an object field into an ordered map, optionally capped at
/// `max_entries` (iteration order is the serde_json map order).
pub(crate) fn get_map(
    raw: &Value,
    key: &str,
    max_entries: Option<usize>,
) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    if let Some(obj) = raw.get(key).and_then(Value::as_object) {
        for (k, v) in obj {
            if let Some(cap) = max_entries {
                if out.len() >= cap {
                    break;
                }
            }
            out.insert(k.clone(), v.clone());
        }
    }
    out
}

/// Stringifies a scalar-ish JSON value the way exception values are
/// rendered: strings verbatim, everything else compact JSON.
pub(crate) fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim_string_preserves_short_input() {
        assert_eq!(trim_string("hello", 10), "hello");
    }

    #[test]
    fn test_trim_string_appends_ellipsis() {
        let trimmed = trim_string("abcdefghij", 8);
        assert_eq!(trimmed, "abcde...");
        assert_eq!(trimmed.chars().count(), 8);
    }

    #[test]
    fn test_get_u64_accepts_string_numbers() {
        let raw = json!({"lineno": "42"});
        assert_eq!(get_u64(&raw, "lineno"), Some(42));
    }

    #[test]
    fn test_get_addr_canonicalizes() {
        let raw = json!({"a": "0xDEADBEEF", "b": 16});
        assert_eq!(get_addr(&raw, "a").as_deref(), Some("0xdeadbeef"));
        assert_eq!(get_addr(&raw, "b").as_deref(), Some("0x10"));
        assert_eq!(get_addr(&raw, "c"), None);
    }

    #[test]
    fn test_get_str_ignores_empty_and_wrong_types() {
        let raw = json!({"a": "", "b": 3, "c": "ok"});
        assert_eq!(get_str(&raw, "a"), None);
        assert_eq!(get_str(&raw, "b"), None);
        assert_eq!(get_str(&raw, "c").as_deref(), Some("ok"));
    }
}
