//! Domain 層
//!
//! Relay の状態（接続・識別子の紐付け・ルーム所属）と、
//! インバウンドイベントから配信計画（fan-out）を計算する純粋なロジックを定義します。
//! I/O は行わず、配信は `MessagePusher` trait を通して Infrastructure 層が担います。

pub mod entity;
pub mod error;
pub mod presence;
pub mod pusher;
pub mod registry;
pub mod relay;
pub mod room_router;
pub mod value_object;

pub use entity::ChatMessage;
pub use error::{MessagePushError, RelayStateError, ValueObjectError};
pub use presence::{PresenceTracker, PresenceTransition};
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::ConnectionRegistry;
pub use relay::{ConnectionSnapshot, Delivery, Relay, RelayEvent, RelaySnapshot, RoomSnapshot};
pub use room_router::RoomRouter;
pub use value_object::{ConnectionId, ConnectionIdFactory, RoomId, Timestamp, UserId};

#[cfg(test)]
pub use pusher::MockMessagePusher;
