//! The grouping context threaded through every strategy call.
//!
//! The context is an immutable value; scoped overrides ("run this sub-call
//! with the app variant") create a modified copy instead of mutating shared
//! state, so concurrent grouping runs for independent events can never
//! observe each other.

use faultline_protocol::Event;

use crate::config::GroupingConfig;

/// The named variant a strategy call is producing components for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VariantKind {
    /// All frames.
    System,
    /// In-app frames only.
    App,
    /// Interfaces without a system/app split (message, security, template).
    Default,
}

impl VariantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariantKind::System => "system",
            VariantKind::App => "app",
            VariantKind::Default => "default",
        }
    }
}

/// Borrowed, copyable state for one strategy invocation.
#[derive(Debug, Clone, Copy)]
pub struct GroupingContext<'a> {
    pub config: &'a GroupingConfig,
    pub event: &'a Event,
    pub variant: VariantKind,
}

impl<'a> GroupingContext<'a> {
    pub fn new(config: &'a GroupingConfig, event: &'a Event) -> GroupingContext<'a> {
        GroupingContext {
            config,
            event,
            variant: VariantKind::Default,
        }
    }

    /// A copy of this context scoped to another variant.
    pub fn with_variant(self, variant: VariantKind) -> GroupingContext<'a> {
        GroupingContext { variant, ..self }
    }

    pub fn event_platform(&self) -> Option<&'a str> {
        self.event.platform.as_deref()
    }
}
