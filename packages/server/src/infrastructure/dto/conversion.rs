//! Conversion logic between DTOs and domain entities.

use tayori_shared::time::timestamp_to_rfc3339;

use crate::domain::{self, RelayEvent, RelaySnapshot};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::ChatMessage> for domain::ChatMessage {
    fn from(dto: dto::ChatMessage) -> Self {
        Self {
            id: dto.id,
            content: dto.content,
            created_at: dto.created_at,
            sender_id: dto.sender_id,
            extra: dto.extra,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<domain::ChatMessage> for dto::ChatMessage {
    fn from(model: domain::ChatMessage) -> Self {
        Self {
            id: model.id,
            content: model.content,
            created_at: model.created_at,
            sender_id: model.sender_id,
            extra: model.extra,
        }
    }
}

impl From<RelayEvent> for dto::ServerEvent {
    fn from(event: RelayEvent) -> Self {
        match event {
            RelayEvent::UserStatus(transition) => {
                dto::ServerEvent::UserStatus(dto::UserStatusPayload {
                    user_id: transition.user_id.into_string(),
                    online: transition.online,
                    last_seen: transition.last_seen.map(|t| t.value()),
                })
            }
            RelayEvent::MessageNew(message) => dto::ServerEvent::MessageNew(message.into()),
            RelayEvent::UserTyping {
                from_user_id,
                typing,
            } => dto::ServerEvent::UserTyping(dto::TypingNotice {
                from_user_id: from_user_id.into_string(),
                typing,
            }),
        }
    }
}

impl From<RelaySnapshot> for http::RelayStateDto {
    fn from(snapshot: RelaySnapshot) -> Self {
        Self {
            connections: snapshot
                .connections
                .into_iter()
                .map(|c| http::ConnectionDetailDto {
                    connection_id: c.connection_id.into_string(),
                    user_id: c.user_id.map(|u| u.into_string()),
                    rooms: c.rooms.into_iter().map(|r| r.into_string()).collect(),
                    connected_at: timestamp_to_rfc3339(c.connected_at.value()),
                })
                .collect(),
            online_users: snapshot
                .online_users
                .into_iter()
                .map(|u| u.into_string())
                .collect(),
            rooms: snapshot
                .rooms
                .into_iter()
                .map(|r| http::RoomSummaryDto {
                    id: r.room_id.into_string(),
                    member_count: r.member_count,
                })
                .collect(),
        }
    }
}
