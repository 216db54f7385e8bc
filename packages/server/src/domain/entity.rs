//! Entities relayed through the domain.

use serde_json::{Map, Value};

/// Chat message as produced by the persistence gateway.
///
/// The relay never alters, validates or stores it. Fields it does not know
/// about are kept in `extra` so the message is re-emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    /// ISO-8601 creation time, passed through as-is
    pub created_at: String,
    pub sender_id: String,
    /// Everything else, including the optional `sender` object
    pub extra: Map<String, Value>,
}
