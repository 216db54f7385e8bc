//! Error types for the relay client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// No live connection after exhausting reconnect attempts
    #[error("Not connected to the relay")]
    NotConnected,

    /// Outbound event could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
