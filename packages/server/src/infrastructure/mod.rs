//! Infrastructure 層
//!
//! - `dto`: ワイヤープロトコル（WebSocket / HTTP）の型と Domain Model との変換
//! - `message_pusher`: `MessagePusher` trait の実装

pub mod dto;
pub mod message_pusher;
