//! UseCase 層
//!
//! インバウンドイベントの種類ごとに 1 つのユースケースを定義します。
//!
//! ## 直列化
//!
//! 全てのユースケースは同じ `SharedRelay` を共有し、ロックを取得してから
//! 「状態の更新」と「結果の配信」を最後まで行います。
//! これにより、接続ごとの I/O は並行に動きつつ、状態を変更する処理は
//! 単一のイベントループと同等の順序で実行されます。

mod connect_client;
mod disconnect_client;
mod error;
mod fanout;
mod get_relay_state;
mod manage_room;
mod notify_typing;
mod send_message;
mod update_presence;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::Relay;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::RelayError;
pub use get_relay_state::GetRelayStateUseCase;
pub use manage_room::RoomMembershipUseCase;
pub use notify_typing::NotifyTypingUseCase;
pub use send_message::SendMessageUseCase;
pub use update_presence::UpdatePresenceUseCase;

/// The single owned relay state shared by all use cases
pub type SharedRelay = Arc<Mutex<Relay>>;

pub fn new_shared_relay() -> SharedRelay {
    Arc::new(Mutex::new(Relay::new()))
}
