//! UseCase: ルームへの参加・退出（room:join / room:leave）
//!
//! 所属の変更だけを行い、配信は発生しません。

use crate::domain::{ConnectionId, RoomId};

use super::{RelayError, SharedRelay};

pub struct RoomMembershipUseCase {
    relay: SharedRelay,
}

impl RoomMembershipUseCase {
    pub fn new(relay: SharedRelay) -> Self {
        Self { relay }
    }

    /// ルームに参加する
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 新たに参加した
    /// * `Ok(false)` - 既に参加済み（何もしない）
    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, RelayError> {
        let joined = self.relay.lock().await.join_room(connection_id, room_id)?;
        if joined {
            tracing::info!("Connection '{}' joined room '{}'", connection_id, room_id);
        } else {
            tracing::debug!(
                "Connection '{}' is already in room '{}'",
                connection_id,
                room_id
            );
        }
        Ok(joined)
    }

    /// ルームから退出する
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 退出した
    /// * `Ok(false)` - 参加していなかった（何もしない）
    pub async fn leave(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, RelayError> {
        let left = self.relay.lock().await.leave_room(connection_id, room_id)?;
        if left {
            tracing::info!("Connection '{}' left room '{}'", connection_id, room_id);
        }
        Ok(left)
    }
}
