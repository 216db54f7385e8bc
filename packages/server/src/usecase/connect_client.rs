//! UseCase: 接続受付
//!
//! 接続 ID を割り当て、送信チャンネルを登録します。配信は発生しません。

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::domain::{ConnectionId, ConnectionIdFactory, MessagePusher, PusherChannel, Timestamp};

use super::SharedRelay;

pub struct ConnectClientUseCase {
    relay: SharedRelay,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectClientUseCase {
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

    /// 接続を登録し、割り当てた ConnectionId と接続時刻を返す
    pub async fn execute(&self, sender: PusherChannel) -> (ConnectionId, Timestamp) {
        let connection_id = ConnectionIdFactory::generate();
        let connected_at = Timestamp::new(self.clock.now_millis());

        let mut relay = self.relay.lock().await;
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        relay.connect(connection_id.clone(), connected_at);
        tracing::debug!("{} connection(s) live", relay.connection_count());

        (connection_id, connected_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::message_pusher::WebSocketMessagePusher, usecase::new_shared_relay,
    };
    use tayori_shared::time::FixedClock;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_registers_connection() {
        // テスト項目: 接続受付で ConnectionId が割り当てられ、Relay に登録される
        // given (前提条件):
        let relay = new_shared_relay();
        let usecase = ConnectClientUseCase::new(
            relay.clone(),
            Arc::new(WebSocketMessagePusher::default()),
            Arc::new(FixedClock::new(1000)),
        );
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let (connection_id, connected_at) = usecase.execute(tx).await;

        // then (期待する結果):
        assert_eq!(connected_at, Timestamp::new(1000));
        assert!(relay.lock().await.is_connected(&connection_id));
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        // テスト項目: 接続ごとに異なる ConnectionId が割り当てられる
        // given (前提条件):
        let relay = new_shared_relay();
        let usecase = ConnectClientUseCase::new(
            relay.clone(),
            Arc::new(WebSocketMessagePusher::default()),
            Arc::new(FixedClock::new(1000)),
        );
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        // when (操作):
        let (first, _) = usecase.execute(tx1).await;
        let (second, _) = usecase.execute(tx2).await;

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(relay.lock().await.connection_count(), 2);
    }
}
