//! UseCase: メッセージの中継（message:send）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - ルーム参加者（送信者自身の接続を含む）にだけ `message:new` が配信されること
//!
//! ### なぜこのテストが必要か
//! - Relay はメッセージを永続化しない。永続化は HTTP 経由で事前に完了している
//! - 送信者の他のタブ・端末も同じメッセージを受け取る必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルームの全メンバーへの配信
//! - エッジケース：存在しないルーム（配信先 0 件、エラーにしない）

use std::sync::Arc;

use crate::domain::{ChatMessage, ConnectionId, MessagePusher, RoomId};

use super::{SharedRelay, fanout::push_deliveries};

pub struct SendMessageUseCase {
    relay: SharedRelay,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    pub fn new(relay: SharedRelay, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            relay,
            message_pusher,
        }
    }

    /// メッセージをルームに中継する
    ///
    /// # Arguments
    ///
    /// * `from_connection_id` - 送信元の接続（ログ用。配信対象からは除外しない）
    /// * `room_id` - 宛先ルーム
    /// * `message` - 永続化済みのメッセージ（加工しない）
    ///
    /// # Returns
    ///
    /// 配信対象の接続 ID リスト
    pub async fn execute(
        &self,
        from_connection_id: &ConnectionId,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Vec<ConnectionId> {
        let message_id = message.id.clone();

        let relay = self.relay.lock().await;
        let delivery = relay.send_message(room_id, message);
        let targets = delivery.targets.clone();
        push_deliveries(self.message_pusher.as_ref(), [delivery]).await;

        tracing::info!(
            "Relayed message '{}' from connection '{}' to {} member(s) of room '{}'",
            message_id,
            from_connection_id,
            targets.len(),
            room_id
        );
        targets
    }
}
