//! Grouping errors.

use faultline_protocol::ValidationError;
use thiserror::Error;

/// Failures while computing hashes for an event.
///
/// These are deliberately narrow: almost all odd input degrades to
/// non-contributing components with hints instead of erroring, because the
/// surrounding issue tracker cannot tolerate grouping failing outright.
#[derive(Error, Debug)]
pub enum GroupingError {
    /// The explicit-fingerprint path resolved to nothing and no interface
    /// yielded any hash input at all. Distinct from a normal event full of
    /// non-contributing frames, which still hashes.
    #[error("unable to generate a hash for this event: no interface produced any hash input")]
    UnableToGenerateHash,

    /// A strict interface rejected its payload during event assembly.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
