//! Relay aggregate
//!
//! ConnectionRegistry（PresenceTracker 経由）と RoomRouter を 1 つの所有状態にまとめ、
//! インバウンドイベントごとに「状態の更新」と「配信計画（Delivery）」を計算します。
//!
//! ## 不変条件
//!
//! - 接続の紐付けとルーム所属は `disconnect` で必ず解除される
//! - ルーム宛ての配信は、そのルームに join した接続にしか届かない
//! - presence の配信は 0→1 / 1→0 のエッジでのみ発生する
//!
//! この型自体は同期的で排他制御を持ちません。
//! UseCase 層が `Mutex` の内側で 1 イベントずつ処理することで、直列な処理順序を保証します。

use std::collections::HashMap;

use super::{
    entity::ChatMessage,
    error::RelayStateError,
    presence::{PresenceTracker, PresenceTransition},
    room_router::RoomRouter,
    value_object::{ConnectionId, RoomId, Timestamp, UserId},
};

/// Outbound event computed by the relay
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// `user:status`, global
    UserStatus(PresenceTransition),
    /// `message:new`, room-scoped
    MessageNew(ChatMessage),
    /// `user:typing`, point-to-point
    UserTyping { from_user_id: UserId, typing: bool },
}

/// One outbound event together with the connections it is addressed to
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub targets: Vec<ConnectionId>,
    pub event: RelayEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub connection_id: ConnectionId,
    pub user_id: Option<UserId>,
    pub rooms: Vec<RoomId>,
    pub connected_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub member_count: usize,
}

/// Point-in-time view of the relay state (debug endpoint)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySnapshot {
    pub connections: Vec<ConnectionSnapshot>,
    pub online_users: Vec<UserId>,
    pub rooms: Vec<RoomSnapshot>,
}

#[derive(Debug, Default)]
pub struct Relay {
    /// Live connections and the time they were accepted
    connections: HashMap<ConnectionId, Timestamp>,
    presence: PresenceTracker,
    rooms: RoomRouter,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を受け付ける
    pub fn connect(&mut self, connection_id: ConnectionId, connected_at: Timestamp) {
        self.connections.insert(connection_id, connected_at);
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn rooms(&self) -> &RoomRouter {
        &self.rooms
    }

    /// `user:online`
    pub fn go_online(
        &mut self,
        connection_id: &ConnectionId,
        user_id: UserId,
        now: Timestamp,
    ) -> Result<Vec<Delivery>, RelayStateError> {
        self.ensure_connected(connection_id)?;
        let transitions = self.presence.bind(connection_id.clone(), user_id, now);
        Ok(self.status_deliveries(transitions))
    }

    /// `user:offline`
    ///
    /// 届いた接続の紐付けだけを解除します。`last_seen` は offline エッジが発生した場合に使われます。
    pub fn go_offline(
        &mut self,
        connection_id: &ConnectionId,
        last_seen: Timestamp,
    ) -> Result<Vec<Delivery>, RelayStateError> {
        self.ensure_connected(connection_id)?;
        let transition = self.presence.unbind(connection_id, last_seen);
        Ok(self.status_deliveries(transition))
    }

    /// `room:join`
    pub fn join_room(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, RelayStateError> {
        self.ensure_connected(connection_id)?;
        Ok(self.rooms.join(connection_id, room_id))
    }

    /// `room:leave`
    pub fn leave_room(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, RelayStateError> {
        self.ensure_connected(connection_id)?;
        Ok(self.rooms.leave(connection_id, room_id))
    }

    /// `message:send`
    ///
    /// 送信者自身の接続も含めたルームの全メンバーに配信します（他タブの同期のため）。
    /// 送信者がルームに参加しているかは検査しません。
    pub fn send_message(&self, room_id: &RoomId, message: ChatMessage) -> Delivery {
        Delivery {
            targets: self.rooms.members(room_id, None),
            event: RelayEvent::MessageNew(message),
        }
    }

    /// `user:typing`
    pub fn typing(&self, from_user_id: UserId, to_user_id: &UserId, typing: bool) -> Delivery {
        let mut targets: Vec<ConnectionId> = self
            .presence
            .registry()
            .connections_of(to_user_id)
            .into_iter()
            .collect();
        targets.sort();
        Delivery {
            targets,
            event: RelayEvent::UserTyping {
                from_user_id,
                typing,
            },
        }
    }

    /// Transport close
    ///
    /// ルーム退出と紐付け解除を行ってから接続を破棄します。
    /// 以降、この接続が配信対象になることはありません。
    pub fn disconnect(
        &mut self,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Result<Vec<Delivery>, RelayStateError> {
        self.ensure_connected(connection_id)?;
        self.rooms.leave_all(connection_id);
        let transition = self.presence.unbind(connection_id, now);
        self.connections.remove(connection_id);
        Ok(self.status_deliveries(transition))
    }

    pub fn snapshot(&self) -> RelaySnapshot {
        let mut connections: Vec<ConnectionSnapshot> = self
            .connections
            .iter()
            .map(|(connection_id, connected_at)| ConnectionSnapshot {
                connection_id: connection_id.clone(),
                user_id: self.presence.registry().identity_of(connection_id).cloned(),
                rooms: self.rooms.rooms_of(connection_id),
                connected_at: *connected_at,
            })
            .collect();
        connections.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.connection_id.cmp(&b.connection_id))
        });

        let mut online_users = self.presence.registry().bound_users();
        online_users.sort();

        let rooms = self
            .rooms
            .room_sizes()
            .into_iter()
            .map(|(room_id, member_count)| RoomSnapshot {
                room_id,
                member_count,
            })
            .collect();

        RelaySnapshot {
            connections,
            online_users,
            rooms,
        }
    }

    fn ensure_connected(&self, connection_id: &ConnectionId) -> Result<(), RelayStateError> {
        if self.is_connected(connection_id) {
            Ok(())
        } else {
            Err(RelayStateError::UnknownConnection(
                connection_id.as_str().to_string(),
            ))
        }
    }

    /// Presence is not room-scoped: every live connection receives status changes.
    fn status_deliveries(
        &self,
        transitions: impl IntoIterator<Item = PresenceTransition>,
    ) -> Vec<Delivery> {
        transitions
            .into_iter()
            .map(|transition| Delivery {
                targets: self.connections.keys().cloned().collect(),
                event: RelayEvent::UserStatus(transition),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn message(id: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            content: "hello".to_string(),
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
            sender_id: "u1".to_string(),
            extra: Map::new(),
        }
    }

    fn relay_with(connections: &[&str]) -> Relay {
        let mut relay = Relay::new();
        for (i, id) in connections.iter().enumerate() {
            relay.connect(conn(id), Timestamp::new(i as i64));
        }
        relay
    }

    fn status_events(deliveries: &[Delivery]) -> Vec<PresenceTransition> {
        deliveries
            .iter()
            .filter_map(|d| match &d.event {
                RelayEvent::UserStatus(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_online_status_is_broadcast_globally() {
        // テスト項目: online 遷移はルームに関係なく全接続（送信元を含む）に配信される
        // given (前提条件):
        let mut relay = relay_with(&["a", "b", "anonymous"]);

        // when (操作):
        let deliveries = relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();

        // then (期待する結果):
        assert_eq!(deliveries.len(), 1);
        let mut targets = deliveries[0].targets.clone();
        targets.sort();
        assert_eq!(targets, vec![conn("a"), conn("anonymous"), conn("b")]);
    }

    #[test]
    fn test_multi_device_presence_scenario() {
        // テスト項目: 同一ユーザーの 2 接続で online は 1 回、最後の切断でのみ offline が 1 回配信される
        // given (前提条件):
        let mut relay = relay_with(&["a", "a2"]);

        // when (操作):
        let first = relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();
        let second = relay.go_online(&conn("a2"), user("u1"), Timestamp::new(2)).unwrap();
        let close_a = relay.disconnect(&conn("a"), Timestamp::new(3)).unwrap();
        let close_a2 = relay.disconnect(&conn("a2"), Timestamp::new(4)).unwrap();

        // then (期待する結果):
        assert_eq!(status_events(&first).len(), 1);
        assert!(status_events(&first)[0].online);
        assert!(second.is_empty());
        assert!(close_a.is_empty());
        let offline = status_events(&close_a2);
        assert_eq!(offline.len(), 1);
        assert!(!offline[0].online);
        assert_eq!(offline[0].last_seen, Some(Timestamp::new(4)));
    }

    #[test]
    fn test_explicit_offline_with_other_devices_is_silent() {
        // テスト項目: 他の接続が残っている状態での user:offline は配信を発生させない
        // given (前提条件):
        let mut relay = relay_with(&["a", "a2"]);
        relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();
        relay.go_online(&conn("a2"), user("u1"), Timestamp::new(1)).unwrap();

        // when (操作):
        let deliveries = relay.go_offline(&conn("a"), Timestamp::new(50)).unwrap();

        // then (期待する結果):
        assert!(deliveries.is_empty());
        assert!(relay.presence().is_online(&user("u1")));
        assert_eq!(relay.presence().registry().identity_of(&conn("a")), None);
    }

    #[test]
    fn test_explicit_offline_uses_caller_last_seen() {
        // テスト項目: user:offline で offline エッジが発生した場合、呼び出し元の lastSeen が使われる
        // given (前提条件):
        let mut relay = relay_with(&["a", "b"]);
        relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();

        // when (操作):
        let deliveries = relay.go_offline(&conn("a"), Timestamp::new(1234)).unwrap();

        // then (期待する結果):
        let offline = status_events(&deliveries);
        assert_eq!(offline[0].last_seen, Some(Timestamp::new(1234)));
        // 明示的に offline にした後の切断では再配信されない
        let on_close = relay.disconnect(&conn("a"), Timestamp::new(9999)).unwrap();
        assert!(on_close.is_empty());
    }

    #[test]
    fn test_message_reaches_room_members_only() {
        // テスト項目: message:new は送信者を含むルーム参加者にだけ配信される
        // given (前提条件):
        let mut relay = relay_with(&["a", "b", "c"]);
        relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();
        relay.go_online(&conn("b"), user("u2"), Timestamp::new(1)).unwrap();
        relay.go_online(&conn("c"), user("u3"), Timestamp::new(1)).unwrap();
        relay.join_room(&conn("a"), &room("r1")).unwrap();
        relay.join_room(&conn("b"), &room("r1")).unwrap();

        // when (操作):
        let delivery = relay.send_message(&room("r1"), message("m1"));

        // then (期待する結果):
        let mut targets = delivery.targets.clone();
        targets.sort();
        assert_eq!(targets, vec![conn("a"), conn("b")]);
        assert_eq!(delivery.event, RelayEvent::MessageNew(message("m1")));
    }

    #[test]
    fn test_message_to_unknown_room_has_no_targets() {
        // テスト項目: 存在しないルームへの送信は配信先 0 件（エラーにならない）
        // given (前提条件):
        let relay = relay_with(&["a"]);

        // when (操作):
        let delivery = relay.send_message(&room("ghost"), message("m1"));

        // then (期待する結果):
        assert!(delivery.targets.is_empty());
    }

    #[test]
    fn test_typing_is_point_to_point() {
        // テスト項目: user:typing は宛先ユーザーに紐付いた接続にだけ配信される
        // given (前提条件):
        let mut relay = relay_with(&["a", "b", "b2", "c"]);
        relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();
        relay.go_online(&conn("b"), user("u2"), Timestamp::new(1)).unwrap();
        relay.go_online(&conn("b2"), user("u2"), Timestamp::new(1)).unwrap();
        relay.go_online(&conn("c"), user("u3"), Timestamp::new(1)).unwrap();
        relay.join_room(&conn("c"), &room("r1")).unwrap();
        relay.join_room(&conn("a"), &room("r1")).unwrap();

        // when (操作):
        let delivery = relay.typing(user("u1"), &user("u2"), true);

        // then (期待する結果):
        assert_eq!(delivery.targets, vec![conn("b"), conn("b2")]);
        assert_eq!(
            delivery.event,
            RelayEvent::UserTyping {
                from_user_id: user("u1"),
                typing: true
            }
        );
    }

    #[test]
    fn test_disconnect_clears_rooms_and_binding() {
        // テスト項目: 切断で全ルームからの退出と紐付け解除が行われる
        // given (前提条件):
        let mut relay = relay_with(&["a", "b"]);
        relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();
        relay.join_room(&conn("a"), &room("r1")).unwrap();
        relay.join_room(&conn("a"), &room("r2")).unwrap();

        // when (操作):
        let deliveries = relay.disconnect(&conn("a"), Timestamp::new(7)).unwrap();

        // then (期待する結果):
        assert!(!relay.is_connected(&conn("a")));
        assert!(relay.rooms().members(&room("r1"), None).is_empty());
        assert_eq!(relay.presence().registry().identity_of(&conn("a")), None);
        // offline は残っている接続にだけ配信される
        assert_eq!(deliveries[0].targets, vec![conn("b")]);
    }

    #[test]
    fn test_events_from_unknown_connection_are_rejected() {
        // テスト項目: 未登録の接続からの状態変更は UnknownConnection になり、状態は変わらない
        // given (前提条件):
        let mut relay = relay_with(&["a"]);

        // when (操作):
        let online = relay.go_online(&conn("ghost"), user("u1"), Timestamp::new(1));
        let join = relay.join_room(&conn("ghost"), &room("r1"));
        let close = relay.disconnect(&conn("ghost"), Timestamp::new(1));

        // then (期待する結果):
        let expected = RelayStateError::UnknownConnection("ghost".to_string());
        assert_eq!(online.unwrap_err(), expected);
        assert_eq!(join.unwrap_err(), expected);
        assert_eq!(close.unwrap_err(), expected);
        assert!(!relay.presence().is_online(&user("u1")));
        assert!(relay.rooms().room_sizes().is_empty());
    }

    #[test]
    fn test_snapshot_reports_connections_users_and_rooms() {
        // テスト項目: スナップショットに接続・online ユーザー・ルームが反映される
        // given (前提条件):
        let mut relay = relay_with(&["a", "b"]);
        relay.go_online(&conn("a"), user("u1"), Timestamp::new(1)).unwrap();
        relay.join_room(&conn("a"), &room("r1")).unwrap();
        relay.join_room(&conn("b"), &room("r1")).unwrap();

        // when (操作):
        let snapshot = relay.snapshot();

        // then (期待する結果):
        assert_eq!(snapshot.connections.len(), 2);
        assert_eq!(snapshot.connections[0].connection_id, conn("a"));
        assert_eq!(snapshot.connections[0].user_id, Some(user("u1")));
        assert_eq!(snapshot.connections[1].user_id, None);
        assert_eq!(snapshot.online_users, vec![user("u1")]);
        assert_eq!(
            snapshot.rooms,
            vec![RoomSnapshot {
                room_id: room("r1"),
                member_count: 2
            }]
        );
    }
}
