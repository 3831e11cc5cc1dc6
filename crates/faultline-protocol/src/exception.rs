//! Exception chain interface.
//!
//! A chain is ordered oldest-to-newest. Entries may be `null` in the wire
//! payload as placeholders for omitted or invalid data; those stay at their
//! index so parallel arrays (raw stacktraces, per-exception meta) keep
//! lining up. Display code filters the `None`s, hashing code iterates the
//! real entries in order.

use serde::Serialize;
use serde_json::Value;

use crate::mechanism::Mechanism;
use crate::stacktrace::Stacktrace;
use crate::utils::{get_trimmed_str, stringify, trim_string, MAX_VALUE_LENGTH};

/// One exception in a chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SingleException {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<Mechanism>,
    /// Symbolicated stacktrace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
    /// The original stacktrace before symbolication, when both exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_stacktrace: Option<Stacktrace>,
}

impl SingleException {
    /// Normalizes one raw exception object. Never fails.
    pub fn from_value(raw: &Value) -> SingleException {
        // Non-string values (dicts thrown by misbehaving SDKs) are kept by
        // rendering them as compact JSON rather than dropped.
        let value = raw
            .get("value")
            .and_then(stringify)
            .map(|v| trim_string(&v, MAX_VALUE_LENGTH));

        let thread_id = raw.get("thread_id").map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        SingleException {
            ty: get_trimmed_str(raw, "type", MAX_VALUE_LENGTH),
            value,
            module: get_trimmed_str(raw, "module", MAX_VALUE_LENGTH),
            thread_id: thread_id.filter(|s| !s.is_empty() && s != "null"),
            mechanism: raw
                .get("mechanism")
                .filter(|m| m.is_object())
                .map(Mechanism::from_value),
            stacktrace: raw.get("stacktrace").map(Stacktrace::from_value).filter(|s| !s.is_empty()),
            raw_stacktrace: raw
                .get("raw_stacktrace")
                .map(Stacktrace::from_value)
                .filter(|s| !s.is_empty()),
        }
    }
}

/// An ordered exception chain with index-aligned `None` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExceptionChain {
    pub values: Vec<Option<SingleException>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exc_omitted: Option<(u64, u64)>,
}

impl ExceptionChain {
    /// Normalizes the `exception` payload. Accepts both the modern
    /// `{"values": [...]}` envelope and the legacy bare array. `null` and
    /// non-object entries become `None` placeholders at the same index.
    pub fn from_value(raw: &Value) -> ExceptionChain {
        let entries = match raw {
            Value::Array(entries) => Some(entries),
            Value::Object(_) => raw.get("values").and_then(Value::as_array),
            _ => None,
        };

        let values = entries
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| {
                        if entry.is_object() {
                            Some(SingleException::from_value(entry))
                        } else {
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let exc_omitted = raw
            .get("exc_omitted")
            .and_then(Value::as_array)
            .and_then(|pair| match pair.as_slice() {
                [start, end] => Some((start.as_u64()?, end.as_u64()?)),
                _ => None,
            });

        ExceptionChain { values, exc_omitted }
    }

    /// The real exceptions in chain order, placeholders filtered.
    pub fn exceptions(&self) -> impl Iterator<Item = &SingleException> {
        self.values.iter().filter_map(Option::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.exceptions().next().is_none()
    }

    /// The newest exception, the one that actually surfaced.
    pub fn newest(&self) -> Option<&SingleException> {
        self.values.iter().rev().find_map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_none_placeholders_preserve_positions() {
        let chain = ExceptionChain::from_value(&json!({
            "values": [null, {"type": "ValueError"}, null, {"type": "KeyError"}]
        }));
        assert_eq!(chain.values.len(), 4);
        assert!(chain.values[0].is_none());
        assert!(chain.values[2].is_none());
        assert_eq!(
            chain.values[1].as_ref().unwrap().ty.as_deref(),
            Some("ValueError")
        );
        assert_eq!(chain.exceptions().count(), 2);
        assert_eq!(chain.newest().unwrap().ty.as_deref(), Some("KeyError"));
    }

    #[test]
    fn test_legacy_bare_array_accepted() {
        let chain = ExceptionChain::from_value(&json!([{"type": "OSError"}]));
        assert_eq!(chain.values.len(), 1);
        assert_eq!(chain.values[0].as_ref().unwrap().ty.as_deref(), Some("OSError"));
    }

    #[test]
    fn test_non_string_value_is_rendered_as_json() {
        let exception = SingleException::from_value(&json!({
            "type": "TypeError",
            "value": {"code": 4}
        }));
        assert_eq!(exception.value.as_deref(), Some(r#"{"code":4}"#));
    }

    #[test]
    fn test_exception_keeps_raw_stacktrace_separate() {
        let exception = SingleException::from_value(&json!({
            "type": "Crash",
            "stacktrace": {"frames": [{"function": "symbolicated"}]},
            "raw_stacktrace": {"frames": [{"instruction_addr": "0x1000"}]}
        }));
        let frames = &exception.stacktrace.as_ref().unwrap().frames;
        assert_eq!(frames[0].function.as_deref(), Some("symbolicated"));
        let raw = &exception.raw_stacktrace.as_ref().unwrap().frames;
        assert_eq!(raw[0].instruction_addr.as_deref(), Some("0x1000"));
    }
}
