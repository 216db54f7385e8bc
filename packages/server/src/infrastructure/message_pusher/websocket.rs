//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - `RelayEvent` をワイヤー形式（JSON）にエンコードして送信（broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の受付と sender の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、メッセージ送信にだけ使用します。
//! sender の先では接続ごとの送信タスクが WebSocket に書き込むため、
//! ここでの送信はブロックしません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RelayEvent},
    infrastructure::dto::websocket::ServerEvent,
};

/// Encode a relay event as a wire frame.
pub fn encode_event(event: &RelayEvent) -> Result<String, MessagePushError> {
    let server_event = ServerEvent::from(event.clone());
    serde_json::to_string(&server_event).map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
}

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::default();
/// pusher.register_client(connection_id.clone(), tx).await;
/// pusher.broadcast(vec![connection_id], &event).await?;
/// ```
pub struct WebSocketMessagePusher {
    /// Key: connection_id, Value: PusherChannel
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RelayEvent,
    ) -> Result<(), MessagePushError> {
        if targets.is_empty() {
            return Ok(());
        }
        let frame = encode_event(event)?;
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(&target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(frame.clone()) {
                        tracing::warn!("Failed to push message to connection '{}': {}", target, e);
                    } else {
                        tracing::debug!("Broadcasted message to connection '{}'", target);
                    }
                }
                None => {
                    tracing::warn!(
                        "Connection '{}' not found during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use tokio::sync::mpsc;

    fn create_test_pusher() -> (
        WebSocketMessagePusher,
        Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
    ) {
        let clients = Arc::new(Mutex::new(HashMap::new()));
        let pusher = WebSocketMessagePusher::new(clients.clone());
        (pusher, clients)
    }

    fn typing_event() -> RelayEvent {
        RelayEvent::UserTyping {
            from_user_id: UserId::new("u1".to_string()).unwrap(),
            typing: true,
        }
    }

    const TYPING_FRAME: &str = r#"{"event":"user:typing","data":{"fromUserId":"u1","typing":true}}"#;

    #[tokio::test]
    async fn test_register_and_broadcast_to_single_connection() {
        // テスト項目: 登録した接続にエンコード済みのイベントを送信できる
        // given (前提条件):
        let (pusher, _clients) = create_test_pusher();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::new("c1");
        pusher.register_client(connection_id.clone(), tx).await;

        // when (操作):
        let result = pusher.broadcast(vec![connection_id], &typing_event()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some(TYPING_FRAME.to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_channel() {
        // テスト項目: 受信側が閉じた接続があっても残りの接続には届く
        // given (前提条件):
        let (pusher, _clients) = create_test_pusher();
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        let (open_tx, mut open_rx) = mpsc::unbounded_channel();
        pusher.register_client(ConnectionId::new("c1"), closed_tx).await;
        pusher.register_client(ConnectionId::new("c2"), open_tx).await;
        drop(closed_rx);

        // when (操作):
        let targets = vec![ConnectionId::new("c1"), ConnectionId::new("c2")];
        let result = pusher.broadcast(targets, &typing_event()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(open_rx.recv().await, Some(TYPING_FRAME.to_string()));
    }

    #[tokio::test]
    async fn test_broadcast_partial_failure() {
        // テスト項目: ブロードキャスト時、一部の接続が存在しなくても成功する
        // given (前提条件):
        let (pusher, clients) = create_test_pusher();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        {
            let mut clients_lock = clients.lock().await;
            clients_lock.insert(ConnectionId::new("c1"), tx1);
            clients_lock.insert(ConnectionId::new("c2"), tx2);
        }

        // when (操作):
        let targets = vec![
            ConnectionId::new("c1"),
            ConnectionId::new("c2"),
            ConnectionId::new("gone"),
        ];
        let result = pusher.broadcast(targets, &typing_event()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx1.recv().await, Some(TYPING_FRAME.to_string()));
        assert_eq!(rx2.recv().await, Some(TYPING_FRAME.to_string()));
    }

    #[tokio::test]
    async fn test_unregistered_client_receives_nothing() {
        // テスト項目: 登録解除した接続にはブロードキャストが届かない
        // given (前提条件):
        let (pusher, _clients) = create_test_pusher();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection_id = ConnectionId::new("c1");
        pusher.register_client(connection_id.clone(), tx).await;

        // when (操作):
        pusher.unregister_client(&connection_id).await;
        pusher
            .broadcast(vec![connection_id], &typing_event())
            .await
            .unwrap();

        // then (期待する結果): sender が破棄されているのでチャンネルは閉じている
        assert_eq!(rx.recv().await, None);
    }
}
