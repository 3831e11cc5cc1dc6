//! Threads interface.

use serde::Serialize;
use serde_json::Value;

use crate::stacktrace::Stacktrace;
use crate::utils::{get_bool, get_str};

/// One thread record.
///
/// A thread whose stacktrace carries no frames normalizes to an absent
/// stacktrace, never an empty-but-present one. The "does this thread have a
/// stacktrace" check during grouping depends on that.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Thread {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub crashed: bool,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_stacktrace: Option<Stacktrace>,
}

impl Thread {
    /// Normalizes one raw thread object. Never fails.
    pub fn from_value(raw: &Value) -> Thread {
        let id = raw.get("id").and_then(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Thread {
            id,
            name: get_str(raw, "name"),
            crashed: get_bool(raw, "crashed").unwrap_or(false),
            current: get_bool(raw, "current").unwrap_or(false),
            state: get_str(raw, "state"),
            stacktrace: raw
                .get("stacktrace")
                .and_then(Stacktrace::from_value_non_empty),
            raw_stacktrace: raw
                .get("raw_stacktrace")
                .and_then(Stacktrace::from_value_non_empty),
        }
    }
}

/// The ordered thread list of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Threads {
    pub values: Vec<Thread>,
}

impl Threads {
    /// Normalizes the `threads` payload. Accepts `{"values": [...]}` or a
    /// bare array; non-object entries are skipped.
    pub fn from_value(raw: &Value) -> Threads {
        let entries = match raw {
            Value::Array(entries) => Some(entries),
            Value::Object(_) => raw.get("values").and_then(Value::as_array),
            _ => None,
        };

        let values = entries
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.is_object())
                    .map(Thread::from_value)
                    .collect()
            })
            .unwrap_or_default();

        Threads { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}
