//! Errors raised by the declarative plumbing itself.

use thiserror::Error;

/// Context interruption: cancellation or deadline expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("operation canceled")]
    Canceled,
    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// Failure to parse a compound import identifier.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid import ID {id:?}: expected format {expected}")]
    Malformed { id: String, expected: &'static str },
}
