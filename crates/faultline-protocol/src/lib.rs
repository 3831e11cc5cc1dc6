//! # Faultline Protocol
//!
//! Typed, normalized views over raw error-event payloads (the "interfaces"
//! of an event: exception chains, stacktraces, threads, log messages,
//! security reports).
//!
//! Normalization is deliberately forgiving: the wire payload is untrusted
//! and partially malformed by nature, so missing or mistyped optional data
//! defaults to absent instead of failing. Only interfaces with strict
//! requirements (CSP) can reject their payload, and they do so with a
//! typed [`ValidationError`] rather than a panic.

mod error;
mod utils;

pub mod event;
pub mod exception;
pub mod mechanism;
pub mod message;
pub mod security;
pub mod stacktrace;
pub mod template;
pub mod threads;

pub use error::ValidationError;
pub use event::Event;
pub use exception::{ExceptionChain, SingleException};
pub use mechanism::{upgrade_legacy_mechanism, Mechanism, MechanismMeta};
pub use message::Message;
pub use security::{normalize_csp_uri, Csp, ExpectCt, ExpectStaple, Hpkp, CSP_SELF};
pub use stacktrace::{basename, Frame, Stacktrace};
pub use template::Template;
pub use threads::{Thread, Threads};
pub use utils::{MAX_FRAME_VARS, MAX_MESSAGE_LENGTH, MAX_VALUE_LENGTH};
