//! Presence Tracker
//!
//! ユーザーごとの状態機械 Offline → Online → Offline を、
//! ConnectionRegistry の「紐付けが 0 件か否か」から導出します。
//! 遷移は 0→1 / 1→0 のエッジでのみ発生し、重複したシグナルは吸収されます。

use super::{
    registry::ConnectionRegistry,
    value_object::{ConnectionId, Timestamp, UserId},
};

/// A presence edge for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceTransition {
    pub user_id: UserId,
    pub online: bool,
    /// Set only on the offline edge
    pub last_seen: Option<Timestamp>,
}

impl PresenceTransition {
    fn online(user_id: UserId) -> Self {
        Self {
            user_id,
            online: true,
            last_seen: None,
        }
    }

    fn offline(user_id: UserId, last_seen: Timestamp) -> Self {
        Self {
            user_id,
            online: false,
            last_seen: Some(last_seen),
        }
    }
}

#[derive(Debug, Default)]
pub struct PresenceTracker {
    registry: ConnectionRegistry,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.registry.is_bound(user_id)
    }

    /// 接続を識別子に紐付け、発生した遷移を返す
    ///
    /// 接続が別ユーザーに紐付いていた場合、そのユーザーの最後の接続であれば
    /// `now` を lastSeen とした offline 遷移も返します。
    pub fn bind(
        &mut self,
        connection_id: ConnectionId,
        user_id: UserId,
        now: Timestamp,
    ) -> Vec<PresenceTransition> {
        let mut transitions = Vec::new();
        let was_online = self.registry.is_bound(&user_id);

        if let Some(previous) = self.registry.bind(connection_id, user_id.clone())
            && previous != user_id
            && !self.registry.is_bound(&previous)
        {
            transitions.push(PresenceTransition::offline(previous, now));
        }

        if !was_online {
            transitions.push(PresenceTransition::online(user_id));
        }
        transitions
    }

    /// 接続の紐付けを解除し、1→0 のエッジであれば offline 遷移を返す
    pub fn unbind(
        &mut self,
        connection_id: &ConnectionId,
        last_seen: Timestamp,
    ) -> Option<PresenceTransition> {
        let user_id = self.registry.unbind(connection_id)?;
        if self.registry.is_bound(&user_id) {
            return None;
        }
        Some(PresenceTransition::offline(user_id, last_seen))
    }
}
