//! Normalization of a realistic, partially messy payload end to end.

use faultline_protocol::{upgrade_legacy_mechanism, Event};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn full_event_normalizes() {
    let raw = json!({
        "platform": "python",
        "level": "error",
        "logger": "app.worker",
        "transaction": "/api/orders",
        "logentry": {"message": "order %s failed", "params": ["1234"]},
        "exception": {"values": [
            null,
            {
                "type": "ValueError",
                "value": 42,
                "module": "app.orders",
                "thread_id": 7,
                "stacktrace": {"frames": [
                    {"function": "handle", "abs_path": "/srv/app/orders.py", "lineno": 10},
                    {"function": "parse", "abs_path": "/srv/app/parse.py", "lineno": "88"}
                ]}
            }
        ]},
        "fingerprint": ["{{ type }}", "orders"]
    });

    let event = Event::from_value(&raw).expect("payload should normalize");

    let chain = event.exception.as_ref().unwrap();
    assert_eq!(chain.values.len(), 2);
    assert!(chain.values[0].is_none());

    let exc = chain.newest().unwrap();
    assert_eq!(exc.ty.as_deref(), Some("ValueError"));
    assert_eq!(exc.value.as_deref(), Some("42"));
    assert_eq!(exc.thread_id.as_deref(), Some("7"));

    let frames = &exc.stacktrace.as_ref().unwrap().frames;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].filename.as_deref(), Some("parse.py"));
    assert_eq!(frames[1].lineno, Some(88));

    assert_eq!(
        event.fingerprint,
        Some(vec!["{{ type }}".to_string(), "orders".to_string()])
    );
    assert_eq!(
        event.logentry.unwrap().text_for_grouping(),
        Some("order %s failed")
    );
}

#[test]
fn threads_with_empty_frames_lose_their_stacktrace() {
    let event = Event::from_value(&json!({
        "threads": {"values": [
            {"id": 0, "crashed": true, "stacktrace": {"frames": []}},
            {"id": 1, "stacktrace": {"frames": [{"function": "run"}]}}
        ]}
    }))
    .unwrap();

    let threads = event.threads.unwrap();
    assert!(threads.values[0].stacktrace.is_none());
    assert!(threads.values[1].stacktrace.is_some());
}

#[test]
fn invalid_csp_directive_is_rejected() {
    let err = Event::from_value(&json!({
        "csp": {"effective_directive": "bogus-src", "blocked_uri": "https://x.test"}
    }))
    .unwrap_err();
    assert!(err.to_string().contains("bogus-src"));
}

#[test]
fn legacy_mechanism_payloads_upgrade_in_place() {
    let legacy = json!({
        "posix_signal": {"signal": 11, "name": "SIGSEGV"},
        "relevant_address": "0x1234"
    });
    let upgraded = upgrade_legacy_mechanism(&legacy);
    assert_eq!(upgraded["type"], "generic");
    assert_eq!(upgraded["meta"]["signal"]["number"], 11);
    assert_eq!(upgrade_legacy_mechanism(&upgraded), upgraded);
}
