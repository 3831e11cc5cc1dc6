//! The assembled, typed view over one raw event payload.

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::exception::ExceptionChain;
use crate::message::Message;
use crate::security::{Csp, ExpectCt, ExpectStaple, Hpkp};
use crate::stacktrace::Stacktrace;
use crate::template::Template;
use crate::threads::Threads;
use crate::utils::{get_str, get_trimmed_str, MAX_VALUE_LENGTH};

/// One reported error/crash occurrence with all present interfaces
/// normalized. This is the sole input to grouping; it knows nothing about
/// HTTP, storage or the surrounding product.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionChain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<Threads>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logentry: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csp: Option<Csp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hpkp: Option<Hpkp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expectct: Option<ExpectCt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expectstaple: Option<ExpectStaple>,
    /// Client-supplied fingerprint override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Vec<String>>,
    /// Client-supplied opaque checksum override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl Event {
    /// Builds the typed view from a raw wire payload.
    ///
    /// Optional interfaces that fail to make sense are silently absent; the
    /// only hard failure is a present-but-invalid CSP report, which is a
    /// strict interface.
    pub fn from_value(raw: &Value) -> Result<Event, ValidationError> {
        let exception = raw
            .get("exception")
            .map(ExceptionChain::from_value)
            .filter(|chain| !chain.values.is_empty());

        let stacktrace = raw
            .get("stacktrace")
            .filter(|v| v.is_object())
            .map(Stacktrace::from_value)
            .filter(|s| !s.is_empty());

        let threads = raw
            .get("threads")
            .map(Threads::from_value)
            .filter(|t| !t.is_empty());

        // `logentry` is the structured form; a bare top-level `message`
        // string is the legacy spelling.
        let logentry = raw
            .get("logentry")
            .or_else(|| raw.get("message"))
            .map(Message::from_value)
            .filter(|m| !m.is_empty());

        let template = raw
            .get("template")
            .filter(|v| v.is_object())
            .map(Template::from_value)
            .filter(|t| !t.is_empty());

        let csp = raw
            .get("csp")
            .filter(|v| v.is_object())
            .map(Csp::from_value)
            .transpose()?;

        let fingerprint = raw.get("fingerprint").and_then(Value::as_array).map(|fp| {
            fp.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        tracing::trace!(
            has_exception = exception.is_some(),
            has_stacktrace = stacktrace.is_some(),
            has_threads = threads.is_some(),
            "normalized event payload"
        );

        Ok(Event {
            platform: get_str(raw, "platform"),
            level: get_str(raw, "level"),
            logger: get_trimmed_str(raw, "logger", MAX_VALUE_LENGTH),
            transaction: get_trimmed_str(raw, "transaction", MAX_VALUE_LENGTH),
            exception,
            stacktrace,
            threads,
            logentry,
            template,
            csp,
            hpkp: raw.get("hpkp").filter(|v| v.is_object()).map(Hpkp::from_value),
            expectct: raw
                .get("expectct")
                .filter(|v| v.is_object())
                .map(ExpectCt::from_value),
            expectstaple: raw
                .get("expectstaple")
                .filter(|v| v.is_object())
                .map(ExpectStaple::from_value),
            fingerprint: fingerprint.filter(|fp| !fp.is_empty()),
            checksum: get_str(raw, "checksum"),
        })
    }

    /// The event-level platform, used when frames carry no override.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_assembles_present_interfaces() {
        let event = Event::from_value(&json!({
            "platform": "python",
            "exception": {"values": [{"type": "ValueError", "value": "boom"}]},
            "logentry": {"formatted": "boom"},
            "fingerprint": ["{{ default }}", "shard-7"]
        }))
        .unwrap();
        assert_eq!(event.platform(), Some("python"));
        assert!(event.exception.is_some());
        assert!(event.logentry.is_some());
        assert!(event.threads.is_none());
        assert_eq!(
            event.fingerprint.as_deref(),
            Some(&["{{ default }}".to_string(), "shard-7".to_string()][..])
        );
    }

    #[test]
    fn test_bare_message_string_becomes_logentry() {
        let event = Event::from_value(&json!({"message": "it broke"})).unwrap();
        assert_eq!(
            event.logentry.unwrap().message.as_deref(),
            Some("it broke")
        );
    }

    #[test]
    fn test_invalid_csp_fails_assembly() {
        let err = Event::from_value(&json!({"csp": {"blocked_uri": "x"}}));
        assert!(matches!(err, Err(ValidationError::MissingField(_))));
    }
}
