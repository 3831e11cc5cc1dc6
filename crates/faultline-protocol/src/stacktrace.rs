//! Stacktrace and frame interfaces.
//!
//! Frames arrive oldest-to-newest on the wire and stay that way in memory.
//! "Newest first" rendering is a display concern and must never leak into
//! the normalized form, since hashing depends on the original order.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::utils::{
    get_addr, get_bool, get_map, get_str, get_str_list, get_trimmed_str, get_u64, trim_string,
    MAX_FRAME_VARS, MAX_VALUE_LENGTH,
};

/// One stack location. Every field is optional; a frame that carries
/// neither `filename` nor `abs_path` still normalizes, it just contributes
/// little to hashing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// The original function name before demangling/trimming by a
    /// symbolicator, when the SDK sends both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Per-frame platform override; falls back to the event platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colno: Option<u64>,
    /// Tri-state: `Some(true)` in-app, `Some(false)` library code, `None`
    /// unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_app: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_line: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_context: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_context: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_addr: Option<String>,
    /// Raw native symbol, used as a fallback when `function` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust: Option<String>,
    /// Local variables, capped to a small number of entries.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, Value>,
    /// Free-form frame metadata (sourcemap info, symbolicator status).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

impl Frame {
    /// Normalizes one raw frame object. Never fails; anything unusable
    /// defaults to absent.
    pub fn from_value(raw: &Value) -> Frame {
        let abs_path = get_trimmed_str(raw, "abs_path", MAX_VALUE_LENGTH);
        let mut filename = get_trimmed_str(raw, "filename", MAX_VALUE_LENGTH);
        // SDKs that only send abs_path still get a filename, since most
        // grouping heuristics key off of it.
        if filename.is_none() {
            filename = abs_path.as_deref().map(basename).map(str::to_string);
        }
        Frame {
            filename,
            abs_path,
            module: get_trimmed_str(raw, "module", MAX_VALUE_LENGTH),
            function: get_trimmed_str(raw, "function", MAX_VALUE_LENGTH),
            raw_function: get_trimmed_str(raw, "raw_function", MAX_VALUE_LENGTH),
            package: get_trimmed_str(raw, "package", MAX_VALUE_LENGTH),
            platform: get_str(raw, "platform"),
            lineno: get_u64(raw, "lineno"),
            colno: get_u64(raw, "colno"),
            in_app: get_bool(raw, "in_app"),
            context_line: get_str(raw, "context_line").map(|l| trim_context_line(&l)),
            pre_context: get_str_list(raw, "pre_context"),
            post_context: get_str_list(raw, "post_context"),
            instruction_addr: get_addr(raw, "instruction_addr"),
            symbol_addr: get_addr(raw, "symbol_addr"),
            image_addr: get_addr(raw, "image_addr"),
            symbol: get_trimmed_str(raw, "symbol", MAX_VALUE_LENGTH),
            trust: get_str(raw, "trust"),
            vars: get_map(raw, "vars", Some(MAX_FRAME_VARS)),
            data: get_map(raw, "data", None),
        }
    }

    /// The platform this frame should be treated as, given the event-level
    /// platform.
    pub fn platform_or<'a>(&'a self, event_platform: Option<&'a str>) -> Option<&'a str> {
        self.platform.as_deref().or(event_platform)
    }
}

/// Returns the path-separator-independent basename of a path.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// An ordered sequence of frames plus optional register state. Owns its
/// frames exclusively.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stacktrace {
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub registers: BTreeMap<String, Value>,
    /// `(start, end)` marker when the SDK elided frames in the middle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames_omitted: Option<(u64, u64)>,
}

impl Stacktrace {
    /// Normalizes a raw stacktrace object. Entries in `frames` that are not
    /// objects are skipped; a missing `frames` key yields an empty list.
    pub fn from_value(raw: &Value) -> Stacktrace {
        let frames = raw
            .get("frames")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.is_object())
                    .map(Frame::from_value)
                    .collect()
            })
            .unwrap_or_default();

        let frames_omitted = raw
            .get("frames_omitted")
            .and_then(Value::as_array)
            .and_then(|pair| match pair.as_slice() {
                [start, end] => Some((start.as_u64()?, end.as_u64()?)),
                _ => None,
            });

        Stacktrace {
            frames,
            registers: get_map(raw, "registers", None),
            frames_omitted,
        }
    }

    /// Normalizes like [`Stacktrace::from_value`] but collapses stacktraces
    /// with no frames to `None`. Consumers checking "does this thing have a
    /// stacktrace" rely on frameless stacktraces being absent, not
    /// empty-but-present.
    pub fn from_value_non_empty(raw: &Value) -> Option<Stacktrace> {
        if !raw.is_object() {
            return None;
        }
        let stacktrace = Stacktrace::from_value(raw);
        if stacktrace.frames.is_empty() {
            None
        } else {
            Some(stacktrace)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

/// Trims an over-long context line for storage. Exposed for the template
/// interface which shares frame semantics.
pub(crate) fn trim_context_line(line: &str) -> String {
    trim_string(line, MAX_VALUE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_filename_falls_back_to_abs_path_basename() {
        let frame = Frame::from_value(&json!({"abs_path": "/srv/app/mod/handler.py"}));
        assert_eq!(frame.filename.as_deref(), Some("handler.py"));
        assert_eq!(frame.abs_path.as_deref(), Some("/srv/app/mod/handler.py"));
    }

    #[test]
    fn test_frame_windows_basename() {
        assert_eq!(basename(r"C:\app\main.cs"), "main.cs");
        assert_eq!(basename("main.cs"), "main.cs");
    }

    #[test]
    fn test_frame_vars_are_capped() {
        let mut vars = serde_json::Map::new();
        for i in 0..40 {
            vars.insert(format!("var{i:02}"), json!(i));
        }
        let frame = Frame::from_value(&json!({"filename": "a.py", "vars": vars}));
        assert_eq!(frame.vars.len(), MAX_FRAME_VARS);
    }

    #[test]
    fn test_stacktrace_skips_garbage_frames() {
        let stacktrace = Stacktrace::from_value(&json!({
            "frames": [{"filename": "a.py"}, null, "junk", {"filename": "b.py"}]
        }));
        assert_eq!(stacktrace.len(), 2);
        assert_eq!(stacktrace.frames[0].filename.as_deref(), Some("a.py"));
        assert_eq!(stacktrace.frames[1].filename.as_deref(), Some("b.py"));
    }

    #[test]
    fn test_empty_stacktrace_collapses_to_none() {
        assert!(Stacktrace::from_value_non_empty(&json!({"frames": []})).is_none());
        assert!(Stacktrace::from_value_non_empty(&json!({})).is_none());
        assert!(Stacktrace::from_value_non_empty(&json!(null)).is_none());
        assert!(
            Stacktrace::from_value_non_empty(&json!({"frames": [{"lineno": 1}]})).is_some()
        );
    }

    #[test]
    fn test_frames_omitted_pair() {
        let stacktrace = Stacktrace::from_value(&json!({
            "frames": [{"filename": "a.py"}],
            "frames_omitted": [4, 8]
        }));
        assert_eq!(stacktrace.frames_omitted, Some((4, 8)));
    }
}
