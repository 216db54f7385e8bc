//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// `GET /debug/relay`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStateDto {
    pub connections: Vec<ConnectionDetailDto>,
    pub online_users: Vec<String>,
    pub rooms: Vec<RoomSummaryDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDetailDto {
    pub connection_id: String,
    pub user_id: Option<String>,
    pub rooms: Vec<String>,
    pub connected_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub member_count: usize,
}
