//! Variant assembly and hash derivation, the public face of the crate.
//!
//! Override precedence is strict: a custom fingerprint replaces the
//! strategies (one hash per resolved entry), a checksum is used verbatim
//! when no fingerprint is set, and only events with neither run the
//! interface strategies at all.

use faultline_protocol::Event;

use crate::component::GroupingComponent;
use crate::config::GroupingConfig;
use crate::context::{GroupingContext, VariantKind};
use crate::error::GroupingError;
use crate::fingerprint::resolve_fingerprint;
use crate::hashing::{hash_from_values, push_deduped};
use crate::strategies;

/// One way of hashing an event.
#[derive(Debug, Clone)]
pub enum GroupingVariant {
    /// A client-supplied checksum, passed through verbatim.
    Checksum { checksum: String },
    /// A resolved custom fingerprint.
    Fingerprint { values: Vec<String> },
    /// A strategy-built component tree.
    Component {
        kind: VariantKind,
        component: GroupingComponent,
    },
}

impl GroupingVariant {
    /// A human-readable name for issue UIs and debugging output.
    pub fn name(&self) -> &'static str {
        match self {
            GroupingVariant::Checksum { .. } => "checksum",
            GroupingVariant::Fingerprint { .. } => "custom-fingerprint",
            GroupingVariant::Component { kind, .. } => kind.as_str(),
        }
    }

    /// The flat hashes this variant produces. A fingerprint yields one
    /// hash per resolved entry; the other variants yield at most one.
    pub fn hashes(&self) -> Vec<String> {
        match self {
            GroupingVariant::Checksum { checksum } => vec![checksum.clone()],
            GroupingVariant::Fingerprint { values } => values
                .iter()
                .map(|value| hash_from_values([value]))
                .collect(),
            GroupingVariant::Component { component, .. } => {
                if component.contributes_to_hash() {
                    vec![hash_from_values(component.flatten_values())]
                } else {
                    Vec::new()
                }
            }
        }
    }
}

/// Everything grouping derived for one event, before hash reduction.
#[derive(Debug, Default)]
pub struct GroupingVariants {
    /// Flat variants in hash emission order.
    pub variants: Vec<GroupingVariant>,
    /// Hierarchical levels, most specific first.
    pub hierarchical: Vec<(String, GroupingComponent)>,
}

/// The final hashes for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHashes {
    /// Deduplicated flat hashes in first-seen order.
    pub flat: Vec<String>,
    /// Hierarchical hashes, most specific first.
    pub hierarchical: Vec<String>,
}

/// Flat component variants are emitted alphabetically by name so hash
/// order is stable across runs regardless of map internals.
const FLAT_EMISSION_ORDER: [VariantKind; 3] =
    [VariantKind::App, VariantKind::Default, VariantKind::System];

pub fn get_grouping_variants(
    event: &Event,
    config: &GroupingConfig,
) -> GroupingVariants {
    if let Some(fingerprint) = event.fingerprint.as_ref().filter(|f| !f.is_empty()) {
        let values = resolve_fingerprint(event, fingerprint);
        return GroupingVariants {
            variants: vec![GroupingVariant::Fingerprint { values }],
            hierarchical: Vec::new(),
        };
    }

    if let Some(checksum) = event.checksum.as_ref().filter(|c| !c.is_empty()) {
        return GroupingVariants {
            variants: vec![GroupingVariant::Checksum {
                checksum: checksum.clone(),
            }],
            hierarchical: Vec::new(),
        };
    }

    let ctx = GroupingContext::new(config, event);
    let Some(output) = strategies::run_primary_strategy(event, ctx) else {
        return GroupingVariants::default();
    };

    let mut by_kind = output.variants;
    let mut variants = Vec::with_capacity(by_kind.len());
    for kind in FLAT_EMISSION_ORDER {
        if let Some(component) = by_kind.remove(&kind) {
            variants.push(GroupingVariant::Component { kind, component });
        }
    }
    GroupingVariants {
        variants,
        hierarchical: output.hierarchical,
    }
}

/// Derives the flat and hierarchical hashes for an event.
pub fn get_hashes(
    event: &Event,
    config: &GroupingConfig,
) -> Result<EventHashes, GroupingError> {
    let grouping = get_grouping_variants(event, config);

    let mut flat = Vec::new();
    for variant in &grouping.variants {
        for hash in variant.hashes() {
            push_deduped(&mut flat, hash);
        }
    }
    // Only the explicit-fingerprint override can fail outright; the
    // strategy path always yields a result, even an empty one, so that
    // grouping never rejects a structurally valid event.
    if flat.is_empty()
        && matches!(
            grouping.variants.first(),
            Some(GroupingVariant::Fingerprint { .. })
        )
    {
        return Err(GroupingError::UnableToGenerateHash);
    }

    let mut hierarchical = Vec::new();
    for (name, component) in &grouping.hierarchical {
        if component.contributes_to_hash() {
            push_deduped(&mut hierarchical, hash_from_values(component.flatten_values()));
        } else {
            tracing::trace!(level = name.as_str(), "hierarchical level has nothing to hash");
        }
    }

    tracing::debug!(
        flat = flat.len(),
        hierarchical = hierarchical.len(),
        config = config.id.as_str(),
        "derived event hashes"
    );
    Ok(EventHashes { flat, hierarchical })
}
