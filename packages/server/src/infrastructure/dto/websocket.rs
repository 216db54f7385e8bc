//! WebSocket wire protocol.
//!
//! Every text frame is a JSON envelope `{"event": "<name>", "data": <payload>}`.
//! Payload keys are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================
// Client → Relay
// ============================================

/// Inbound events, one variant per event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "user:online")]
    UserOnline(UserOnlinePayload),

    #[serde(rename = "user:offline")]
    UserOffline(UserOfflinePayload),

    #[serde(rename = "room:join")]
    RoomJoin(RoomRef),

    #[serde(rename = "room:leave")]
    RoomLeave(RoomRef),

    #[serde(rename = "message:send")]
    MessageSend(MessageSendPayload),

    #[serde(rename = "user:typing")]
    UserTyping(TypingRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOnlinePayload {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOfflinePayload {
    /// Informational only; the relay unbinds the connection the event arrived on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Epoch milliseconds; the relay uses its own clock when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

/// Room reference: a bare string or `{"roomId": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomRef {
    Bare(String),
    Object(RoomPayload),
}

impl RoomRef {
    pub fn room_id(&self) -> &str {
        match self {
            RoomRef::Bare(room_id) => room_id,
            RoomRef::Object(payload) => &payload.room_id,
        }
    }

    pub fn into_room_id(self) -> String {
        match self {
            RoomRef::Bare(room_id) => room_id,
            RoomRef::Object(payload) => payload.room_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendPayload {
    pub room_id: String,
    pub message: ChatMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub typing: bool,
}

// ============================================
// Relay → Client
// ============================================

/// Outbound events, one variant per event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "user:status")]
    UserStatus(UserStatusPayload),

    #[serde(rename = "message:new")]
    MessageNew(ChatMessage),

    #[serde(rename = "user:typing")]
    UserTyping(TypingNotice),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusPayload {
    pub user_id: String,
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub from_user_id: String,
    pub typing: bool,
}

// ============================================
// Shared
// ============================================

/// Chat message as persisted by the gateway.
///
/// Unknown fields are collected into `extra` and written back unchanged.
/// `sender` is one of them, so nulls and extra sender keys survive the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub sender_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    /// `sender.displayName` when the gateway supplied a string for it
    pub fn sender_display_name(&self) -> Option<&str> {
        self.extra
            .get("sender")
            .and_then(|sender| sender.get("displayName"))
            .and_then(Value::as_str)
    }
}
