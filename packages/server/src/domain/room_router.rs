//! Room Membership Router
//!
//! 接続とルーム名の多対多の関係を保持します。
//! 配信そのものは行わず、`members` でブロードキャスト対象の接続を計算します。

use std::collections::{HashMap, HashSet};

use super::value_object::{ConnectionId, RoomId};

#[derive(Debug, Default)]
pub struct RoomRouter {
    members: HashMap<RoomId, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームに参加する。既に参加済みなら何もせず `false` を返す
    pub fn join(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        let inserted = self
            .members
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone());
        if inserted {
            self.memberships
                .entry(connection_id.clone())
                .or_default()
                .insert(room_id.clone());
        }
        inserted
    }

    /// ルームから退出する。参加していなければ何もせず `false` を返す
    pub fn leave(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        let removed = match self.members.get_mut(room_id) {
            Some(set) => {
                let removed = set.remove(connection_id);
                if set.is_empty() {
                    self.members.remove(room_id);
                }
                removed
            }
            None => false,
        };
        if removed && let Some(rooms) = self.memberships.get_mut(connection_id) {
            rooms.remove(room_id);
            if rooms.is_empty() {
                self.memberships.remove(connection_id);
            }
        }
        removed
    }

    /// 接続が参加している全てのルームから退出し、退出したルームを返す
    pub fn leave_all(&mut self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let rooms: Vec<RoomId> = self
            .memberships
            .remove(connection_id)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for room_id in &rooms {
            if let Some(set) = self.members.get_mut(room_id) {
                set.remove(connection_id);
                if set.is_empty() {
                    self.members.remove(room_id);
                }
            }
        }
        rooms
    }

    /// ブロードキャスト対象（ルーム参加中の接続、`exclude` を除く）
    ///
    /// 存在しないルームは空リストになります。
    pub fn members(&self, room_id: &RoomId, exclude: Option<&ConnectionId>) -> Vec<ConnectionId> {
        self.members
            .get(room_id)
            .map(|set| {
                set.iter()
                    .filter(|id| Some(*id) != exclude)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_member(&self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        self.members
            .get(room_id)
            .is_some_and(|set| set.contains(connection_id))
    }

    /// 接続が参加しているルーム（ソート済み）
    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut rooms: Vec<RoomId> = self
            .memberships
            .get(connection_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// ルームごとの参加接続数（ルーム名でソート済み）
    pub fn room_sizes(&self) -> Vec<(RoomId, usize)> {
        let mut sizes: Vec<(RoomId, usize)> = self
            .members
            .iter()
            .map(|(room_id, set)| (room_id.clone(), set.len()))
            .collect();
        sizes.sort_by(|a, b| a.0.cmp(&b.0));
        sizes
    }
}
