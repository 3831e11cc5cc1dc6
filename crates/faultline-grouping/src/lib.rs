//! Deterministic event grouping: turns a normalized event into the set of
//! hashes that decide which issue it belongs to.
//!
//! The pipeline runs in three stages. Interface strategies build
//! [`GroupingComponent`] trees per named variant, variant assembly applies
//! the checksum and fingerprint overrides, and hash derivation reduces
//! each contributing tree to a stable digest. Everything is a pure
//! function of the event and the [`GroupingConfig`], so the same event
//! always lands in the same group.
//!
//! ```
//! use faultline_grouping::{get_hashes, GroupingConfig};
//! use faultline_protocol::Event;
//!
//! let event = Event::from_value(&serde_json::json!({
//!     "logentry": {"message": "user 42 not found"}
//! }))?;
//! let hashes = get_hashes(&event, &GroupingConfig::newstyle_2023_01_11())?;
//! assert_eq!(hashes.flat.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod component;
mod config;
mod context;
mod error;
mod fingerprint;
mod hashing;
mod strategies;
mod variants;

pub use component::{ComponentValue, GroupingComponent, TreeLabel};
pub use config::GroupingConfig;
pub use context::{GroupingContext, VariantKind};
pub use error::GroupingError;
pub use fingerprint::resolve_fingerprint;
pub use hashing::hash_from_values;
pub use variants::{
    get_grouping_variants, get_hashes, EventHashes, GroupingVariant, GroupingVariants,
};
