//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{Stream, sink::SinkExt, stream::StreamExt};
use tokio::sync::{mpsc, watch};

use crate::{
    domain::{ConnectionId, RoomId, Timestamp, UserId},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::RelayError,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that forwards encoded events from the pusher channel to the WebSocket sink.
///
/// # Arguments
///
/// * `rx` - Channel receiver fed by the `MessagePusher`
/// * `sender` - WebSocket sink of this connection
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Reads frames from one connection and dispatches them until the peer closes or
/// `shutdown` fires.
///
/// `shutdown` is only observed while waiting for the next frame, so an event that
/// is already being dispatched always runs to completion.
async fn receive_loop<S>(
    mut receiver: S,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    mut shutdown: watch::Receiver<bool>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let msg = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                tracing::debug!("Receive loop of '{}' stopped", connection_id);
                break;
            }
            msg = receiver.next() => msg,
        };
        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                tracing::debug!("Received frame on '{}': {}", connection_id, text);

                let Some(event) = parse_client_event(&text) else {
                    continue;
                };
                if let Err(e) = dispatch(&state, &connection_id, event).await {
                    tracing::warn!("Dropped event from connection '{}': {}", connection_id, e);
                }
            }
            Message::Binary(_) => {
                tracing::warn!("Dropped binary frame from connection '{}'", connection_id);
            }
            Message::Ping(_) => {
                tracing::debug!("Received ping");
                // Ping/pong is handled automatically by the WebSocket protocol
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection_id);
                break;
            }
            _ => {}
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    let (connection_id, _connected_at) = state.connect_client_usecase.execute(tx).await;
    tracing::info!("Connection '{}' opened", connection_id);

    // Spawn a task to receive events from this connection
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        state.clone(),
        connection_id.clone(),
        shutdown_rx,
    ));

    // Spawn a task to push relayed events to this connection
    let mut send_task = pusher_loop(rx, sender);

    // The send side is aborted outright. The receive side finishes its current event first.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => {
            let _ = shutdown_tx.send(true);
            if let Err(e) = recv_task.await {
                tracing::warn!("Receive loop of '{}' failed: {}", connection_id, e);
            }
        }
    };

    if let Err(e) = state
        .disconnect_client_usecase
        .execute(&connection_id)
        .await
    {
        tracing::warn!("Failed to disconnect '{}': {}", connection_id, e);
    }
}

/// Decode one text frame, logging and discarding anything that is not a known event
fn parse_client_event(text: &str) -> Option<ClientEvent> {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Dropped malformed frame: {}", e);
            None
        }
    }
}

/// Route one decoded event to its use case
async fn dispatch(
    state: &AppState,
    connection_id: &ConnectionId,
    event: ClientEvent,
) -> Result<(), RelayError> {
    match event {
        ClientEvent::UserOnline(payload) => {
            // Convert String -> UserId (Domain Model)
            let user_id = UserId::new(payload.user_id)?;
            state
                .update_presence_usecase
                .go_online(connection_id, user_id)
                .await?;
        }
        ClientEvent::UserOffline(payload) => {
            // payload の userId は照合用。不正な値でも紐付けの解除は行う
            let claimed = payload.user_id.and_then(|id| UserId::new(id).ok());
            let last_seen = payload.last_seen.map(Timestamp::new);
            state
                .update_presence_usecase
                .go_offline(connection_id, claimed.as_ref(), last_seen)
                .await?;
        }
        ClientEvent::RoomJoin(room) => {
            let room_id = RoomId::new(room.into_room_id())?;
            state
                .room_membership_usecase
                .join(connection_id, &room_id)
                .await?;
        }
        ClientEvent::RoomLeave(room) => {
            let room_id = RoomId::new(room.into_room_id())?;
            state
                .room_membership_usecase
                .leave(connection_id, &room_id)
                .await?;
        }
        ClientEvent::MessageSend(payload) => {
            let room_id = RoomId::new(payload.room_id)?;
            state
                .send_message_usecase
                .execute(connection_id, &room_id, payload.message.into())
                .await;
        }
        ClientEvent::UserTyping(request) => {
            let from_user_id = UserId::new(request.from_user_id)?;
            let to_user_id = UserId::new(request.to_user_id)?;
            state
                .notify_typing_usecase
                .execute(from_user_id, &to_user_id, request.typing)
                .await;
        }
    }
    Ok(())
}
