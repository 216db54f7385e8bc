//! MessagePusher trait 定義
//!
//! 接続へのメッセージ送信（通知）のインターフェースです。
//! Domain は `RelayEvent` を渡すだけで、ワイヤー形式へのエンコードと送信は
//! Infrastructure 層の実装（WebSocket）が担います。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, relay::RelayEvent, value_object::ConnectionId};

/// 接続ごとの送信チャンネル（シリアライズ済みの JSON フレームを流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを削除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 接続の集合にイベントを送信（単一宛先もこれを使う）
    ///
    /// 一部の送信失敗は許容します（ベストエフォート）。
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RelayEvent,
    ) -> Result<(), MessagePushError>;
}
