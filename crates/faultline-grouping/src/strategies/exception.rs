//! Exception and chained-exception grouping.
//!
//! A single exception groups on its stacktrace plus its type, with the
//! ns-error domain/code taking over on Cocoa and the scrubbed value as a
//! last resort. Chains wrap one component per exception, oldest first, so
//! the hash changes when the cause chain changes.

use faultline_protocol::{ExceptionChain, SingleException};

use crate::component::GroupingComponent;
use crate::context::{GroupingContext, VariantKind};
use crate::strategies::{message, remove_non_stacktrace_variants, stacktrace, StrategyOutput};

fn type_component(exception: &SingleException) -> GroupingComponent {
    let mut component = GroupingComponent::new("type");
    if let Some(ty) = exception.ty.as_deref() {
        component.push(ty);
    }
    if exception
        .mechanism
        .as_ref()
        .is_some_and(|mechanism| mechanism.is_synthetic())
    {
        component.set_non_contributing("ignored because exception is synthetic");
    }
    component
}

fn ns_error_component(exception: &SingleException) -> Option<GroupingComponent> {
    let ns_error = exception
        .mechanism
        .as_ref()
        .and_then(|mechanism| mechanism.meta.ns_error.as_ref())?;
    let mut component = GroupingComponent::new("ns-error");
    if let Some(domain) = ns_error.domain.as_deref() {
        component.push(domain);
    }
    if let Some(code) = ns_error.code {
        component.push(code.to_string());
    }
    if component.values.is_empty() {
        return None;
    }
    Some(component)
}

fn value_component(
    exception: &SingleException,
    ctx: GroupingContext<'_>,
    stacktrace_contributes: bool,
) -> GroupingComponent {
    let mut component = GroupingComponent::new("value");
    if let Some(value) = exception.value.as_deref() {
        let trimmed = if ctx.config.normalize_message {
            let (scrubbed, changed) = message::scrub_message(value);
            if changed {
                component.set_hint("stripped event-specific values");
            }
            scrubbed
        } else {
            value.to_string()
        };
        component.push(trimmed);
    }
    if stacktrace_contributes && component.contributes {
        component.set_non_contributing("ignored because stacktrace takes precedence");
    }
    component
}

/// Components for one exception in the chain, per variant plus hierarchy.
pub(crate) fn single_exception_variants(
    exception: &SingleException,
    ctx: GroupingContext<'_>,
) -> StrategyOutput {
    let ty = type_component(exception);
    let ns_error = ns_error_component(exception);

    let st_output = match exception.stacktrace.as_ref() {
        Some(st) => stacktrace::stacktrace_variants(st, ctx),
        None => {
            let mut output = StrategyOutput::default();
            for kind in [VariantKind::System, VariantKind::App] {
                output
                    .variants
                    .insert(kind, GroupingComponent::new("stacktrace"));
            }
            output
        }
    };

    let mut output = StrategyOutput::default();
    for (kind, stacktrace_component) in st_output.variants {
        let stacktrace_contributes = stacktrace_component.contributes_to_hash();
        let mut values = vec![stacktrace_component.into(), ty.clone().into()];
        if let Some(ns_error) = ns_error.clone() {
            values.push(ns_error.into());
        }
        if ctx.config.with_exception_value_fallback {
            values.push(value_component(exception, ctx, stacktrace_contributes).into());
        }
        output
            .variants
            .insert(kind, GroupingComponent::with_values("exception", values));
    }
    for (name, level) in st_output.hierarchical {
        let wrapped = GroupingComponent::with_values(
            "exception",
            [level.into(), ty.clone().into()],
        );
        output.hierarchical.push((name, wrapped));
    }
    output
}

/// Components for the whole chain. A single-entry chain collapses to the
/// bare exception component; longer chains wrap one component per
/// exception, oldest first, and never emit hierarchical levels.
pub(crate) fn chained_exception_variants(
    chain: &ExceptionChain,
    ctx: GroupingContext<'_>,
) -> StrategyOutput {
    let exceptions: Vec<&SingleException> = chain.exceptions().collect();

    let mut output = if let [single] = exceptions.as_slice() {
        single_exception_variants(single, ctx)
    } else {
        let mut per_variant: std::collections::BTreeMap<VariantKind, Vec<GroupingComponent>> =
            Default::default();
        for exception in &exceptions {
            let single = single_exception_variants(exception, ctx);
            for (kind, component) in single.variants {
                per_variant.entry(kind).or_default().push(component);
            }
        }
        let mut output = StrategyOutput::default();
        for (kind, components) in per_variant {
            output.variants.insert(
                kind,
                GroupingComponent::with_values(
                    "chained-exception",
                    components.into_iter().map(Into::into),
                ),
            );
        }
        output
    };

    remove_non_stacktrace_variants(&mut output.variants);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingConfig;
    use faultline_protocol::Event;
    use serde_json::json;

    fn context_for<'a>(
        config: &'a GroupingConfig,
        event: &'a Event,
    ) -> GroupingContext<'a> {
        GroupingContext::new(config, event)
    }

    fn event_from(raw: serde_json::Value) -> Event {
        Event::from_value(&raw).unwrap()
    }

    #[test]
    fn test_synthetic_exception_suppresses_type() {
        let event = event_from(json!({
            "exception": {"values": [{
                "type": "SIGSEGV",
                "mechanism": {"type": "signal", "synthetic": true}
            }]}
        }));
        let config = GroupingConfig::newstyle_2023_01_11();
        let ctx = context_for(&config, &event);
        let output =
            chained_exception_variants(event.exception.as_ref().unwrap(), ctx);

        let system = &output.variants[&VariantKind::System];
        let ty = system.find("type").unwrap();
        assert!(!ty.contributes);
        assert_eq!(
            ty.hint.as_deref(),
            Some("ignored because exception is synthetic")
        );
    }

    #[test]
    fn test_value_ignored_when_stacktrace_contributes() {
        let event = event_from(json!({
            "platform": "python",
            "exception": {"values": [{
                "type": "ValueError",
                "value": "bad input 17",
                "stacktrace": {"frames": [
                    {"function": "main", "filename": "app.py", "in_app": true}
                ]}
            }]}
        }));
        let config = GroupingConfig::newstyle_2023_01_11();
        let ctx = context_for(&config, &event);
        let output =
            chained_exception_variants(event.exception.as_ref().unwrap(), ctx);

        let system = &output.variants[&VariantKind::System];
        let value = system.find("value").unwrap();
        assert!(!value.contributes);
        assert!(system.find("stacktrace").unwrap().contributes);
    }

    #[test]
    fn test_value_fallback_without_stacktrace() {
        let event = event_from(json!({
            "exception": {"values": [{"type": "ValueError", "value": "id 12345 missing"}]}
        }));
        let config = GroupingConfig::newstyle_2023_01_11();
        let ctx = context_for(&config, &event);
        let output =
            chained_exception_variants(event.exception.as_ref().unwrap(), ctx);

        let system = &output.variants[&VariantKind::System];
        let value = system.find("value").unwrap();
        assert!(value.contributes);
        assert_eq!(value.flatten_values(), vec!["id <int> missing"]);
    }

    #[test]
    fn test_chain_wraps_oldest_first() {
        let event = event_from(json!({
            "exception": {"values": [
                {"type": "IOError", "value": "root cause"},
                {"type": "RuntimeError", "value": "wrapper"}
            ]}
        }));
        let config = GroupingConfig::newstyle_2023_01_11();
        let ctx = context_for(&config, &event);
        let output =
            chained_exception_variants(event.exception.as_ref().unwrap(), ctx);

        let system = &output.variants[&VariantKind::System];
        assert_eq!(system.id, "chained-exception");
        let types: Vec<String> = system
            .subcomponents()
            .map(|exc| exc.find("type").unwrap().flatten_values().join(""))
            .collect();
        assert_eq!(types, vec!["IOError", "RuntimeError"]);
        assert!(output.hierarchical.is_empty());
    }

    #[test]
    fn test_ns_error_component() {
        let event = event_from(json!({
            "exception": {"values": [{
                "type": "NSError",
                "mechanism": {
                    "type": "ns_error",
                    "meta": {"ns_error": {"domain": "NSCocoaErrorDomain", "code": -42}}
                }
            }]}
        }));
        let config = GroupingConfig::newstyle_2023_01_11();
        let ctx = context_for(&config, &event);
        let output =
            chained_exception_variants(event.exception.as_ref().unwrap(), ctx);

        let ns_error = output.variants[&VariantKind::System].find("ns-error").unwrap();
        assert_eq!(
            ns_error.flatten_values(),
            vec!["NSCocoaErrorDomain", "-42"]
        );
    }
}
