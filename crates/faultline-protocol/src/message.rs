//! Log message interface (`logentry`).

use serde::Serialize;
use serde_json::Value;

use crate::utils::{get_trimmed_str, trim_string, MAX_MESSAGE_LENGTH};

/// A log message, either plain or parameterized.
///
/// `message` holds the raw template (with `%s`-style placeholders when
/// `params` is set), `formatted` the interpolated result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Message {
    /// Normalizes the `logentry` payload. A bare string is accepted as a
    /// plain message. Never fails.
    pub fn from_value(raw: &Value) -> Message {
        if let Some(text) = raw.as_str() {
            return Message {
                message: if text.is_empty() {
                    None
                } else {
                    Some(trim_string(text, MAX_MESSAGE_LENGTH))
                },
                formatted: None,
                params: None,
            };
        }

        let params = raw
            .get("params")
            .filter(|p| p.is_array() || p.is_object())
            .filter(|p| {
                p.as_array().map(|a| !a.is_empty()).unwrap_or(true)
                    && p.as_object().map(|o| !o.is_empty()).unwrap_or(true)
            })
            .cloned();

        Message {
            message: get_trimmed_str(raw, "message", MAX_MESSAGE_LENGTH),
            formatted: get_trimmed_str(raw, "formatted", MAX_MESSAGE_LENGTH),
            params,
        }
    }

    /// The text used for grouping: the raw template when parameters exist
    /// (so interpolated values do not fan out into distinct hashes),
    /// otherwise the formatted text.
    pub fn text_for_grouping(&self) -> Option<&str> {
        if self.params.is_some() {
            self.message.as_deref().or(self.formatted.as_deref())
        } else {
            self.formatted.as_deref().or(self.message.as_deref())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.formatted.is_none()
    }
}
