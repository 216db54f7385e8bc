//! UseCase errors.
//!
//! いずれのエラーも送信元には返さず、UI 層でログに記録して処理を続けます。

use thiserror::Error;

use crate::domain::{RelayStateError, ValueObjectError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Event arrived for a connection the relay no longer knows
    #[error("Connection '{0}' is not registered")]
    UnknownConnection(String),

    /// Payload field failed value object validation
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValueObjectError),
}

impl From<RelayStateError> for RelayError {
    fn from(error: RelayStateError) -> Self {
        match error {
            RelayStateError::UnknownConnection(id) => RelayError::UnknownConnection(id),
        }
    }
}
