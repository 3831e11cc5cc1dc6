//! Custom fingerprint resolution.
//!
//! A fingerprint entry is either a literal string, kept verbatim, or a
//! `{{ variable }}` placeholder resolved against the event. Placeholders
//! that resolve to nothing drop out, so a fingerprint of
//! `["{{ type }}", "payments"]` still works for an event without an
//! exception.

use once_cell::sync::Lazy;
use regex::Regex;

use faultline_protocol::{Event, Frame};

static FINGERPRINT_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{\{\s*([a-zA-Z0-9._-]+)\s*\}\}$").unwrap()
});

/// The frame whose function/package/filename a fingerprint refers to: the
/// newest frame of the primary stacktrace.
fn primary_frame(event: &Event) -> Option<&Frame> {
    let stacktrace = event
        .exception
        .as_ref()
        .and_then(|chain| chain.newest())
        .and_then(|exception| exception.stacktrace.as_ref())
        .or(event.stacktrace.as_ref())?;
    stacktrace.frames.last()
}

fn resolve_variable(event: &Event, name: &str) -> Option<String> {
    let newest = event.exception.as_ref().and_then(|chain| chain.newest());
    match name {
        "type" => newest.and_then(|exc| exc.ty.clone()),
        "value" => newest.and_then(|exc| exc.value.clone()),
        "module" => newest.and_then(|exc| exc.module.clone()),
        "function" => primary_frame(event).and_then(|frame| frame.function.clone()),
        "package" => primary_frame(event).and_then(|frame| frame.package.clone()),
        "filename" => primary_frame(event).and_then(|frame| frame.filename.clone()),
        "message" => event
            .logentry
            .as_ref()
            .and_then(|logentry| logentry.text_for_grouping())
            .map(str::to_string),
        "logger" => event.logger.clone(),
        "level" => event.level.clone(),
        "transaction" => event.transaction.clone(),
        _ => None,
    }
}

/// Resolves a fingerprint to the final hash inputs. Literal entries pass
/// through untouched; placeholders naming an unknown variable stay
/// verbatim so a typo is visible in the issue rather than silently
/// dropped.
pub fn resolve_fingerprint(event: &Event, entries: &[String]) -> Vec<String> {
    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(captures) = FINGERPRINT_VAR_RE.captures(entry) else {
            resolved.push(entry.clone());
            continue;
        };
        let name = &captures[1];
        match resolve_variable(event, name) {
            Some(value) => resolved.push(value),
            None if is_known_variable(name) => {
                tracing::debug!(variable = name, "fingerprint variable resolved to nothing");
            }
            None => resolved.push(entry.clone()),
        }
    }
    resolved
}

fn is_known_variable(name: &str) -> bool {
    matches!(
        name,
        "type"
            | "value"
            | "module"
            | "function"
            | "package"
            | "filename"
            | "message"
            | "logger"
            | "level"
            | "transaction"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn event_from(raw: serde_json::Value) -> Event {
        Event::from_value(&raw).unwrap()
    }

    #[test]
    fn test_literals_pass_through() {
        let event = event_from(json!({}));
        let entries = vec!["payments".to_string(), "checkout".to_string()];
        assert_eq!(
            resolve_fingerprint(&event, &entries),
            vec!["payments", "checkout"]
        );
    }

    #[test]
    fn test_exception_variables_resolve() {
        let event = event_from(json!({
            "exception": {"values": [{
                "type": "ValueError",
                "value": "boom",
                "module": "app.tasks",
                "stacktrace": {"frames": [
                    {"function": "outer"},
                    {"function": "inner", "filename": "worker.py"}
                ]}
            }]}
        }));
        let entries: Vec<String> = ["{{ type }}", "{{ function }}", "{{ filename }}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            resolve_fingerprint(&event, &entries),
            vec!["ValueError", "inner", "worker.py"]
        );
    }

    #[test]
    fn test_unresolved_known_variable_is_dropped() {
        let event = event_from(json!({"logentry": {"message": "hi"}}));
        let entries: Vec<String> =
            ["{{ type }}", "{{ message }}"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_fingerprint(&event, &entries), vec!["hi"]);
    }

    #[test]
    fn test_unknown_variable_stays_verbatim() {
        let event = event_from(json!({}));
        let entries = vec!["{{ nope }}".to_string()];
        assert_eq!(resolve_fingerprint(&event, &entries), vec!["{{ nope }}"]);
    }
}
