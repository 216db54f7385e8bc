//! UseCase: 接続の切断
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() メソッド
//! - 切断された接続がルーム・紐付け・送信チャンネルから完全に取り除かれること
//!
//! ### なぜこのテストが必要か
//! - 切断後の接続に配信しようとすると、閉じたチャンネルへの送信失敗がログを埋める
//! - 最後の接続が切断されたユーザーは offline として全員に通知される必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：最後の接続の切断（offline を配信）
//! - 他端末あり：同じユーザーの別接続が残っている（配信なし）
//! - 未紐付け：user:online を送らずに切断（配信なし）

use std::sync::Arc;

use tayori_shared::time::Clock;

use crate::domain::{ConnectionId, MessagePusher, PresenceTransition, Timestamp};

use super::{
    RelayError, SharedRelay,
    fanout::{push_deliveries, transitions_of},
};

pub struct DisconnectClientUseCase {
    relay: SharedRelay,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DisconnectClientUseCase {
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

    /// 接続を破棄する
    ///
    /// # Returns
    ///
    /// * `Ok(Some(transition))` - ユーザーが offline になった
    /// * `Ok(None)` - presence に変化なし
    /// * `Err(RelayError::UnknownConnection)` - 既に破棄済み
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<Option<PresenceTransition>, RelayError> {
        let now = Timestamp::new(self.clock.now_millis());

        let mut relay = self.relay.lock().await;
        self.message_pusher.unregister_client(connection_id).await;
        let deliveries = relay.disconnect(connection_id, now)?;
        let transition = transitions_of(&deliveries).into_iter().next();
        push_deliveries(self.message_pusher.as_ref(), deliveries).await;

        tracing::info!(
            "Connection '{}' closed, {} connection(s) remaining",
            connection_id,
            relay.connection_count()
        );
        if let Some(transition) = &transition {
            tracing::info!("User '{}' is now offline", transition.user_id);
        }
        Ok(transition)
    }
}
