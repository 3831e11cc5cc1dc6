//! Thread grouping.
//!
//! Threads only group when exactly one thread can be singled out, by this
//! cascade: a unique crashed thread, else a unique current thread, else
//! the only thread there is. Anything ambiguous produces a
//! non-contributing component so the event falls through to fallback
//! grouping instead of hashing on an arbitrary thread.

use faultline_protocol::{Thread, Threads};

use crate::component::GroupingComponent;
use crate::context::GroupingContext;
use crate::strategies::{remove_non_stacktrace_variants, stacktrace, StrategyOutput};

fn unique<'a>(mut iter: impl Iterator<Item = &'a Thread>) -> Option<&'a Thread> {
    let first = iter.next()?;
    if iter.next().is_some() {
        return None;
    }
    Some(first)
}

fn select_thread(threads: &Threads) -> Option<&Thread> {
    unique(threads.values.iter().filter(|t| t.crashed))
        .or_else(|| unique(threads.values.iter().filter(|t| t.current)))
        .or_else(|| unique(threads.values.iter()))
}

fn ambiguous_output(hint: String) -> StrategyOutput {
    let mut component = GroupingComponent::new("threads");
    component.set_non_contributing(hint);
    let mut output = StrategyOutput::default();
    output
        .variants
        .insert(crate::context::VariantKind::App, component.clone());
    output
        .variants
        .insert(crate::context::VariantKind::System, component);
    output
}

pub(crate) fn threads_variants(
    threads: &Threads,
    ctx: GroupingContext<'_>,
) -> StrategyOutput {
    let Some(thread) = select_thread(threads) else {
        return ambiguous_output(format!(
            "ignored because no single thread could be singled out of {} threads",
            threads.values.len()
        ));
    };
    let Some(st) = thread.stacktrace.as_ref() else {
        return ambiguous_output("ignored because thread has no stacktrace".to_string());
    };

    let mut output = StrategyOutput::default();
    let st_output = stacktrace::stacktrace_variants(st, ctx);
    for (kind, stacktrace_component) in st_output.variants {
        output.variants.insert(
            kind,
            GroupingComponent::with_values("threads", [stacktrace_component.into()]),
        );
    }
    for (name, level) in st_output.hierarchical {
        output
            .hierarchical
            .push((name, GroupingComponent::with_values("threads", [level.into()])));
    }
    remove_non_stacktrace_variants(&mut output.variants);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingConfig;
    use crate::context::VariantKind;
    use faultline_protocol::Event;
    use serde_json::json;

    fn run(raw: serde_json::Value) -> StrategyOutput {
        let event = Event::from_value(&raw).unwrap();
        let config = GroupingConfig::newstyle_2023_01_11();
        let ctx = GroupingContext::new(&config, &event);
        threads_variants(event.threads.as_ref().unwrap(), ctx)
    }

    #[test]
    fn test_unique_crashed_thread_is_selected() {
        let output = run(json!({
            "threads": {"values": [
                {"id": 1, "crashed": false, "stacktrace": {"frames": [{"function": "idle"}]}},
                {"id": 2, "crashed": true, "stacktrace": {"frames": [{"function": "boom"}]}}
            ]}
        }));
        let system = &output.variants[&VariantKind::System];
        assert!(system.contributes);
        assert!(system.flatten_values().contains(&"boom".to_string()));
    }

    #[test]
    fn test_multiple_crashed_threads_are_ambiguous() {
        let output = run(json!({
            "threads": {"values": [
                {"id": 1, "crashed": true},
                {"id": 2, "crashed": true}
            ]}
        }));
        let system = &output.variants[&VariantKind::System];
        assert!(!system.contributes);
        assert!(system.hint.as_deref().unwrap().contains("2 threads"));
    }

    #[test]
    fn test_unique_current_thread_is_selected_without_crashed() {
        let output = run(json!({
            "threads": {"values": [
                {"id": 1, "stacktrace": {"frames": [{"function": "idle"}]}},
                {"id": 2, "current": true, "stacktrace": {"frames": [{"function": "active"}]}},
                {"id": 3, "stacktrace": {"frames": [{"function": "sleep"}]}}
            ]}
        }));
        let system = &output.variants[&VariantKind::System];
        assert!(system.flatten_values().contains(&"active".to_string()));
    }

    #[test]
    fn test_only_thread_is_selected_without_flags() {
        let output = run(json!({
            "threads": {"values": [
                {"id": 7, "stacktrace": {"frames": [{"function": "main"}]}}
            ]}
        }));
        assert!(output.variants[&VariantKind::System].contributes);
    }

    #[test]
    fn test_selected_thread_without_stacktrace() {
        let output = run(json!({
            "threads": {"values": [{"id": 7, "crashed": true}]}
        }));
        let system = &output.variants[&VariantKind::System];
        assert!(!system.contributes);
        assert_eq!(
            system.hint.as_deref(),
            Some("ignored because thread has no stacktrace")
        );
    }
}
