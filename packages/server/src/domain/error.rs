//! Domain errors.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Identifier is empty (or whitespace only)
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Identifier exceeds the maximum length
    #[error("{kind} must be at most {max} characters (got {actual})")]
    TooLong {
        kind: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Errors raised by the relay aggregate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayStateError {
    /// The connection is not (or no longer) registered in the relay
    #[error("Connection '{0}' is not registered")]
    UnknownConnection(String),
}

/// Errors raised while pushing messages to connections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// The event could not be encoded for the wire
    #[error("Failed to encode message: {0}")]
    EncodeFailed(String),
}
