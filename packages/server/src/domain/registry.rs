//! Connection Registry
//!
//! 接続 → ユーザー識別子の紐付けを保持します。
//! 1 接続につき識別子は高々 1 つ、1 ユーザーは複数の接続（複数タブ・複数端末）を持てます。
//! 逆引き用のインデックスを同時に更新し、`connections_of` を O(1) で引けるようにしています。
//!
//! 全ての操作は全域関数です。存在しないキーは `None`（または空集合）になり、エラーにはなりません。

use std::collections::{HashMap, HashSet};

use super::value_object::{ConnectionId, UserId};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    identities: HashMap<ConnectionId, UserId>,
    connections: HashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続に識別子を紐付ける
    ///
    /// 既に別の識別子が紐付いている場合は置き換え、以前の識別子を返します。
    /// 状態遷移の判定は行いません（PresenceTracker の責務）。
    pub fn bind(&mut self, connection_id: ConnectionId, user_id: UserId) -> Option<UserId> {
        let previous = self.unbind(&connection_id);
        self.connections
            .entry(user_id.clone())
            .or_default()
            .insert(connection_id.clone());
        self.identities.insert(connection_id, user_id);
        previous
    }

    /// 接続の紐付けを解除し、紐付いていた識別子を返す
    ///
    /// 匿名の接続（未紐付け）の場合は `None`。
    pub fn unbind(&mut self, connection_id: &ConnectionId) -> Option<UserId> {
        let user_id = self.identities.remove(connection_id)?;
        if let Some(set) = self.connections.get_mut(&user_id) {
            set.remove(connection_id);
            if set.is_empty() {
                self.connections.remove(&user_id);
            }
        }
        Some(user_id)
    }

    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<&UserId> {
        self.identities.get(connection_id)
    }

    /// 指定ユーザーに紐付いている接続の集合
    pub fn connections_of(&self, user_id: &UserId) -> HashSet<ConnectionId> {
        self.connections.get(user_id).cloned().unwrap_or_default()
    }

    /// 少なくとも 1 つの接続が紐付いているか
    pub fn is_bound(&self, user_id: &UserId) -> bool {
        self.connections.contains_key(user_id)
    }

    /// 紐付けを持つユーザーの一覧
    pub fn bound_users(&self) -> Vec<UserId> {
        self.connections.keys().cloned().collect()
    }
}
