//! Client-side relay adapter.
//!
//! [`RelayClient`] owns at most one WebSocket connection to the relay and
//! re-establishes it on demand. Every emitter first makes sure a connection is
//! live and reports `false` instead of failing when none could be opened.
//!
//! The relay forgets identity and room membership when a connection closes, so
//! the adapter remembers both and replays `user:online` and `room:join` after
//! every (re)connection.

use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use futures_util::{SinkExt, StreamExt};
use tayori_server::infrastructure::dto::websocket::{
    ChatMessage, ClientEvent, MessageSendPayload, RoomRef, ServerEvent, TypingRequest,
    UserOfflinePayload, UserOnlinePayload,
};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    config::ReconnectPolicy,
    domain::{ConnectionState, should_attempt_reconnect},
    error::ClientError,
};

const EVENT_BUFFER: usize = 256;

/// What the adapter remembers across connections
#[derive(Debug, Default)]
struct Session {
    writer: Option<mpsc::UnboundedSender<String>>,
    identity: Option<String>,
    rooms: BTreeSet<String>,
}

/// Result of making sure a connection is live
enum Link {
    /// The existing connection is still up
    Existing,
    /// A new connection was opened and the session replayed on it
    Fresh,
}

pub struct RelayClient {
    url: String,
    policy: ReconnectPolicy,
    session: Mutex<Session>,
    state: Arc<watch::Sender<ConnectionState>>,
    generation: Arc<AtomicU64>,
    events: broadcast::Sender<ServerEvent>,
}

impl RelayClient {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            url: url.into(),
            policy,
            session: Mutex::new(Session::default()),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Observe connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Stream of decoded events pushed by the relay
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Open a connection unless one is already live
    ///
    /// Returns `false` after `max_attempts` failed attempts.
    pub async fn ensure_connected(&self) -> bool {
        let mut session = self.session.lock().await;
        self.link(&mut session).await.is_ok()
    }

    /// `user:online`
    pub async fn go_online(&self, user_id: &str) -> bool {
        let mut session = self.session.lock().await;
        session.identity = Some(user_id.to_string());
        match self.link(&mut session).await {
            Ok(Link::Fresh) => true,
            Ok(Link::Existing) => self.emit(
                &session,
                &ClientEvent::UserOnline(UserOnlinePayload {
                    user_id: user_id.to_string(),
                }),
            ),
            Err(_) => false,
        }
    }

    /// `user:offline`
    pub async fn go_offline(&self, last_seen: Option<i64>) -> bool {
        let mut session = self.session.lock().await;
        let user_id = session.identity.take();
        match self.link(&mut session).await {
            Ok(_) => self.emit(
                &session,
                &ClientEvent::UserOffline(UserOfflinePayload { user_id, last_seen }),
            ),
            Err(_) => false,
        }
    }

    /// `room:join`
    pub async fn join_room(&self, room_id: &str) -> bool {
        let mut session = self.session.lock().await;
        session.rooms.insert(room_id.to_string());
        match self.link(&mut session).await {
            Ok(Link::Fresh) => true,
            Ok(Link::Existing) => self.emit(
                &session,
                &ClientEvent::RoomJoin(RoomRef::Bare(room_id.to_string())),
            ),
            Err(_) => false,
        }
    }

    /// `room:leave`
    pub async fn leave_room(&self, room_id: &str) -> bool {
        let mut session = self.session.lock().await;
        session.rooms.remove(room_id);
        match self.link(&mut session).await {
            Ok(_) => self.emit(
                &session,
                &ClientEvent::RoomLeave(RoomRef::Bare(room_id.to_string())),
            ),
            Err(_) => false,
        }
    }

    /// `message:send` with a message already persisted by the gateway
    pub async fn send_message(&self, room_id: &str, message: ChatMessage) -> bool {
        let mut session = self.session.lock().await;
        match self.link(&mut session).await {
            Ok(_) => self.emit(
                &session,
                &ClientEvent::MessageSend(MessageSendPayload {
                    room_id: room_id.to_string(),
                    message,
                }),
            ),
            Err(_) => false,
        }
    }

    /// `user:typing`
    pub async fn set_typing(&self, from_user_id: &str, to_user_id: &str, typing: bool) -> bool {
        let mut session = self.session.lock().await;
        match self.link(&mut session).await {
            Ok(_) => self.emit(
                &session,
                &ClientEvent::UserTyping(TypingRequest {
                    from_user_id: from_user_id.to_string(),
                    to_user_id: to_user_id.to_string(),
                    typing,
                }),
            ),
            Err(_) => false,
        }
    }

    /// Rooms the adapter will rejoin after a reconnection
    pub async fn joined_rooms(&self) -> Vec<String> {
        self.session.lock().await.rooms.iter().cloned().collect()
    }

    /// Close the connection without forgetting identity or rooms
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        session.writer = None;
        self.state.send_replace(ConnectionState::Disconnected);
    }

    async fn link(&self, session: &mut Session) -> Result<Link, ClientError> {
        if self.state().is_connected() && session.writer.as_ref().is_some_and(|w| !w.is_closed()) {
            return Ok(Link::Existing);
        }

        self.state.send_replace(ConnectionState::Connecting);
        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::info!(
                "Attempting to connect to {} (attempt {}/{})",
                self.url,
                attempt,
                self.policy.max_attempts
            );

            match self.open().await {
                Ok(writer) => {
                    session.writer = Some(writer);
                    tracing::info!("Connected to relay at {}", self.url);
                    self.replay(session);
                    return Ok(Link::Fresh);
                }
                Err(e) => {
                    tracing::warn!("Connection attempt failed: {}", e);
                    if !should_attempt_reconnect(attempt, self.policy.max_attempts) {
                        break;
                    }
                    tracing::info!(
                        "Reconnecting in {:?}... (attempt {}/{})",
                        self.policy.retry_interval,
                        attempt + 1,
                        self.policy.max_attempts
                    );
                    tokio::time::sleep(self.policy.retry_interval).await;
                }
            }
        }

        tracing::error!(
            "Failed to connect after {} attempts",
            self.policy.max_attempts
        );
        session.writer = None;
        self.state.send_replace(ConnectionState::Disconnected);
        Err(ClientError::NotConnected)
    }

    /// Open one WebSocket connection and spawn its reader and writer tasks
    async fn open(&self) -> Result<mpsc::UnboundedSender<String>, ClientError> {
        let (ws_stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // reader の Disconnected がこれより後に書かれるよう、spawn 前に確定する
        self.state.send_replace(ConnectionState::Connected);

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    tracing::warn!("Failed to send frame: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        let events = self.events.clone();
        let state = self.state.clone();
        let current_generation = self.generation.clone();
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            // 購読者がいなくても読み続ける
                            let _ = events.send(event);
                        }
                        Err(e) => tracing::warn!("Ignoring undecodable event: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("Relay closed the connection");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // 後続の接続が既に開かれていれば状態を上書きしない
            if current_generation.load(Ordering::SeqCst) == generation {
                state.send_replace(ConnectionState::Disconnected);
            }
        });

        Ok(tx)
    }

    /// Re-announce identity and rooms on a fresh connection
    fn replay(&self, session: &Session) {
        if let Some(user_id) = &session.identity {
            self.emit(
                session,
                &ClientEvent::UserOnline(UserOnlinePayload {
                    user_id: user_id.clone(),
                }),
            );
        }
        for room_id in &session.rooms {
            self.emit(session, &ClientEvent::RoomJoin(RoomRef::Bare(room_id.clone())));
        }
    }

    fn emit(&self, session: &Session, event: &ClientEvent) -> bool {
        let frame = match encode(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("{}", e);
                return false;
            }
        };
        let sent = session
            .writer
            .as_ref()
            .is_some_and(|writer| writer.send(frame).is_ok());
        if !sent {
            tracing::warn!("Connection lost before the event could be sent");
            self.state.send_replace(ConnectionState::Disconnected);
        }
        sent
    }
}

fn encode(event: &ClientEvent) -> Result<String, ClientError> {
    Ok(serde_json::to_string(event)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_client() -> RelayClient {
        // ポート 9 (discard) には通常何も listen していない
        RelayClient::new(
            "ws://127.0.0.1:9/ws",
            ReconnectPolicy::new(2, Duration::from_millis(10)),
        )
    }

    #[test]
    fn test_encode_uses_event_envelope() {
        // テスト項目: 送信イベントは {"event", "data"} の形にエンコードされる
        // given (前提条件):
        let event = ClientEvent::RoomJoin(RoomRef::Bare("r1".to_string()));

        // when (操作):
        let frame = encode(&event).unwrap();

        // then (期待する結果):
        assert_eq!(frame, r#"{"event":"room:join","data":"r1"}"#);
    }

    #[tokio::test]
    async fn test_new_client_is_disconnected() {
        // テスト項目: 生成直後は Disconnected
        // given (前提条件):
        // when (操作):
        let client = unreachable_client();

        // then (期待する結果):
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.url(), "ws://127.0.0.1:9/ws");
    }

    #[tokio::test]
    async fn test_emitters_report_not_connected() {
        // テスト項目: 接続できない場合、ensure_connected と各 emitter は false を返し、状態は Disconnected に戻る
        // given (前提条件):
        let client = unreachable_client();

        // when (操作):
        let connected = client.ensure_connected().await;
        let online = client.go_online("u1").await;
        let joined = client.join_room("r1").await;

        // then (期待する結果):
        assert!(!connected);
        assert!(!online);
        assert!(!joined);
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_rooms_are_remembered_while_disconnected() {
        // テスト項目: 接続できなくても join したルームは記憶され、leave で忘れられる
        // given (前提条件):
        let client = unreachable_client();

        // when (操作):
        client.join_room("r2").await;
        client.join_room("r1").await;
        client.leave_room("r2").await;

        // then (期待する結果):
        assert_eq!(client.joined_rooms().await, vec!["r1".to_string()]);
    }
}
