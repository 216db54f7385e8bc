//! UseCase: presence シグナル（user:online / user:offline）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdatePresenceUseCase::go_online() / go_offline()
//! - 0→1 / 1→0 のエッジでだけ `user:status` が全接続に配信されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の接続での online、最後の接続での offline
//! - 重複シグナル：既に online のユーザーの online、他端末が残っているユーザーの offline
//! - 異常系：未登録の接続からのシグナル

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::domain::{ConnectionId, MessagePusher, PresenceTransition, Timestamp, UserId};

use super::{
    RelayError, SharedRelay,
    fanout::{push_deliveries, transitions_of},
};

pub struct UpdatePresenceUseCase {
    relay: SharedRelay,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl UpdatePresenceUseCase {
    pub fn new(
        relay: SharedRelay,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            relay,
            message_pusher,
            clock,
        }
    }

    /// `user:online`: 接続に識別子を紐付け、発生した遷移を配信する
    ///
    /// # Returns
    ///
    /// 配信した遷移（重複シグナルの場合は空）
    pub async fn go_online(
        &self,
        connection_id: &ConnectionId,
        user_id: UserId,
    ) -> Result<Vec<PresenceTransition>, RelayError> {
        let now = Timestamp::new(self.clock.now_millis());

        let mut relay = self.relay.lock().await;
        let deliveries = relay.go_online(connection_id, user_id, now)?;
        let transitions = transitions_of(&deliveries);
        push_deliveries(self.message_pusher.as_ref(), deliveries).await;

        for transition in &transitions {
            tracing::info!(
                "User '{}' is now {}",
                transition.user_id,
                if transition.online { "online" } else { "offline" }
            );
        }
        Ok(transitions)
    }

    /// `user:offline`: この接続の紐付けだけを解除する
    ///
    /// # Arguments
    ///
    /// * `claimed_user_id` - payload の userId（ログ用）
    /// * `last_seen` - 呼び出し元の lastSeen。省略時はサーバー時刻
    pub async fn go_offline(
        &self,
        connection_id: &ConnectionId,
        claimed_user_id: Option<&UserId>,
        last_seen: Option<Timestamp>,
    ) -> Result<Vec<PresenceTransition>, RelayError> {
        let last_seen = last_seen.unwrap_or_else(|| Timestamp::new(self.clock.now_millis()));

        let mut relay = self.relay.lock().await;
        let bound = relay.presence().registry().identity_of(connection_id).cloned();
        if let Some(claimed) = claimed_user_id
            && bound.as_ref() != Some(claimed)
        {
            tracing::warn!(
                "user:offline for '{}' arrived on connection '{}' bound to {:?}; unbinding the connection",
                claimed,
                connection_id,
                bound.as_ref().map(UserId::as_str)
            );
        }

        let deliveries = relay.go_offline(connection_id, last_seen)?;
        let transitions = transitions_of(&deliveries);
        push_deliveries(self.message_pusher.as_ref(), deliveries).await;

        for transition in &transitions {
            tracing::info!("User '{}' is now offline", transition.user_id);
        }
        Ok(transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockMessagePusher, RelayEvent},
        infrastructure::message_pusher::WebSocketMessagePusher,
        usecase::new_shared_relay,
    };
    use tayori_shared::time::FixedClock;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn relay_with(connections: &[&str]) -> SharedRelay {
        let relay = new_shared_relay();
        {
            let mut guard = relay.lock().await;
            for id in connections {
                guard.connect(ConnectionId::new(*id), Timestamp::new(0));
            }
        }
        relay
    }

    #[tokio::test]
    async fn test_online_broadcast_only_once_for_multiple_connections() {
        // テスト項目: 同じユーザーが 2 つの接続で online を送っても user:status は 1 回だけ配信される
        // given (前提条件):
        let relay = relay_with(&["a", "a2"]).await;
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(|targets, event| {
                targets.len() == 2
                    && matches!(
                        event,
                        RelayEvent::UserStatus(t) if t.online && t.user_id.as_str() == "u1"
                    )
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase =
            UpdatePresenceUseCase::new(relay, Arc::new(pusher), Arc::new(FixedClock::new(10)));

        // when (操作):
        let first = usecase.go_online(&ConnectionId::new("a"), user("u1")).await;
        let second = usecase.go_online(&ConnectionId::new("a2"), user("u1")).await;

        // then (期待する結果):
        assert_eq!(first.unwrap().len(), 1);
        assert!(second.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_with_remaining_device_is_not_broadcast() {
        // テスト項目: 他の接続が残っている場合、user:offline は配信されない
        // given (前提条件):
        let relay = relay_with(&["a", "a2"]).await;
        let usecase = UpdatePresenceUseCase::new(
            relay.clone(),
            Arc::new(WebSocketMessagePusher::default()),
            Arc::new(FixedClock::new(10)),
        );
        usecase.go_online(&ConnectionId::new("a"), user("u1")).await.unwrap();
        usecase.go_online(&ConnectionId::new("a2"), user("u1")).await.unwrap();

        // when (操作):
        let result = usecase
            .go_offline(&ConnectionId::new("a"), Some(&user("u1")), Some(Timestamp::new(99)))
            .await;

        // then (期待する結果):
        assert!(result.unwrap().is_empty());
        assert!(relay.lock().await.presence().is_online(&user("u1")));
    }

    #[tokio::test]
    async fn test_offline_edge_uses_caller_last_seen() {
        // テスト項目: 最後の接続の user:offline では呼び出し元の lastSeen で配信される
        // given (前提条件):
        let relay = relay_with(&["a", "b"]).await;
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(|_, event| matches!(event, RelayEvent::UserStatus(t) if t.online))
            .times(1)
            .returning(|_, _| Ok(()));
        pusher
            .expect_broadcast()
            .withf(|targets, event| {
                targets.len() == 2
                    && matches!(event, RelayEvent::UserStatus(t)
                        if !t.online && t.last_seen == Some(Timestamp::new(4242)))
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase =
            UpdatePresenceUseCase::new(relay, Arc::new(pusher), Arc::new(FixedClock::new(10)));
        usecase.go_online(&ConnectionId::new("a"), user("u1")).await.unwrap();

        // when (操作):
        let result = usecase
            .go_offline(&ConnectionId::new("a"), Some(&user("u1")), Some(Timestamp::new(4242)))
            .await;

        // then (期待する結果):
        let transitions = result.unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].last_seen, Some(Timestamp::new(4242)));
    }

    #[tokio::test]
    async fn test_offline_without_last_seen_uses_server_clock() {
        // テスト項目: lastSeen が省略された場合はサーバー時刻が使われる
        // given (前提条件):
        let relay = relay_with(&["a"]).await;
        let usecase = UpdatePresenceUseCase::new(
            relay,
            Arc::new(WebSocketMessagePusher::default()),
            Arc::new(FixedClock::new(777)),
        );
        usecase.go_online(&ConnectionId::new("a"), user("u1")).await.unwrap();

        // when (操作):
        let result = usecase.go_offline(&ConnectionId::new("a"), None, None).await;

        // then (期待する結果):
        assert_eq!(result.unwrap()[0].last_seen, Some(Timestamp::new(777)));
    }

    #[tokio::test]
    async fn test_signal_from_unknown_connection() {
        // テスト項目: 未登録の接続からのシグナルは UnknownConnection になり、配信されない
        // given (前提条件):
        let relay = relay_with(&[]).await;
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase =
            UpdatePresenceUseCase::new(relay, Arc::new(pusher), Arc::new(FixedClock::new(10)));

        // when (操作):
        let result = usecase.go_online(&ConnectionId::new("ghost"), user("u1")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::UnknownConnection("ghost".to_string()))
        );
    }
}
