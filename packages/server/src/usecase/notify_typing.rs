//! UseCase: 入力中シグナル（user:typing）
//!
//! 宛先ユーザーに紐付いた接続にだけ届けます。ルームにも全体にも配信しません。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, UserId};

use super::{SharedRelay, fanout::push_deliveries};

pub struct NotifyTypingUseCase {
    relay: SharedRelay,
    message_pusher: Arc<dyn MessagePusher>,
}

impl NotifyTypingUseCase {
    pub fn new(relay: SharedRelay, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            relay,
            message_pusher,
        }
    }

    /// # Returns
    ///
    /// 配信対象の接続 ID リスト（宛先が offline なら空）
    pub async fn execute(
        &self,
        from_user_id: UserId,
        to_user_id: &UserId,
        typing: bool,
    ) -> Vec<ConnectionId> {
        let relay = self.relay.lock().await;
        let delivery = relay.typing(from_user_id, to_user_id, typing);
        let targets = delivery.targets.clone();
        push_deliveries(self.message_pusher.as_ref(), [delivery]).await;

        tracing::debug!(
            "Typing signal for '{}' delivered to {} connection(s)",
            to_user_id,
            targets.len()
        );
        targets
    }
}
