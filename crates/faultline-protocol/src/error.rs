//! Validation errors raised during interface normalization.

use thiserror::Error;

/// Raised when an interface with strict requirements is missing or carries
/// malformed required data. Most interfaces never fail normalization; the
/// strict ones (CSP among the implemented set) surface these variants and
/// leave it to the caller to drop the interface, the event, or substitute a
/// default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("Unknown CSP directive: {0}")]
    UnknownDirective(String),
}
