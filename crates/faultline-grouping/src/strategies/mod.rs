//! Grouping strategies: pure functions from one normalized interface (plus
//! the grouping context) to named component variants.
//!
//! The interface set is closed, so dispatch is a fixed priority order
//! rather than a registry: exception > stacktrace > threads > template >
//! security report > message. Strategies run bottom-up (frame components
//! feed stacktrace components feed exception components) and communicate
//! exclusively through the component tree.

use std::collections::BTreeMap;

use faultline_protocol::Event;

use crate::component::GroupingComponent;
use crate::context::{GroupingContext, VariantKind};

pub(crate) mod exception;
pub(crate) mod frame;
pub(crate) mod message;
pub(crate) mod platform;
pub(crate) mod security;
pub(crate) mod stacktrace;
pub(crate) mod template;
pub(crate) mod threads;

/// What one top-level strategy run produces: components per named variant,
/// plus the ordered hierarchical levels when the config asks for them.
#[derive(Debug, Default)]
pub(crate) struct StrategyOutput {
    pub variants: BTreeMap<VariantKind, GroupingComponent>,
    /// `(level name, component)` ordered most-specific first.
    pub hierarchical: Vec<(String, GroupingComponent)>,
}

/// Runs the highest-priority strategy that applies to this event.
pub(crate) fn run_primary_strategy(
    event: &Event,
    ctx: GroupingContext<'_>,
) -> Option<StrategyOutput> {
    if let Some(chain) = event.exception.as_ref().filter(|chain| !chain.is_empty()) {
        return Some(exception::chained_exception_variants(chain, ctx));
    }
    if let Some(st) = event.stacktrace.as_ref() {
        return Some(stacktrace::stacktrace_variants(st, ctx));
    }
    if let Some(t) = event.threads.as_ref() {
        return Some(threads::threads_variants(t, ctx));
    }
    if let Some(t) = event.template.as_ref() {
        return Some(template::template_variants(t, ctx));
    }
    if let Some(csp) = event.csp.as_ref() {
        return Some(security::csp_variants(csp));
    }
    if let Some(hpkp) = event.hpkp.as_ref() {
        return Some(security::hpkp_variants(hpkp));
    }
    if let Some(expectct) = event.expectct.as_ref() {
        return Some(security::expectct_variants(expectct));
    }
    if let Some(expectstaple) = event.expectstaple.as_ref() {
        return Some(security::expectstaple_variants(expectstaple));
    }
    if let Some(logentry) = event.logentry.as_ref() {
        return Some(message::message_variants(logentry, ctx));
    }
    None
}

/// When at least one variant contains a contributing stacktrace, marks the
/// stacktrace-less variants non-contributing. Without this, events with a
/// good system stacktrace would also emit a low-quality type/value hash
/// from the app variant.
pub(crate) fn remove_non_stacktrace_variants(
    variants: &mut BTreeMap<VariantKind, GroupingComponent>,
) {
    if variants.len() <= 1 {
        return;
    }
    let with_stacktrace: Vec<VariantKind> = variants
        .iter()
        .filter(|(_, component)| component.has_contributing("stacktrace"))
        .map(|(kind, _)| *kind)
        .collect();
    if with_stacktrace.is_empty() {
        return;
    }

    let hint_suffix = if with_stacktrace.len() == 1 {
        format!("the {} variant does", with_stacktrace[0].as_str())
    } else {
        "others do".to_string()
    };
    for (kind, component) in variants.iter_mut() {
        if !with_stacktrace.contains(kind) && component.contributes {
            component.set_non_contributing(format!(
                "ignored because this variant does not have a contributing stacktrace, but {hint_suffix}"
            ));
        }
    }
}
