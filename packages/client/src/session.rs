//! Interactive CLI session on top of [`RelayClient`].

use std::sync::Arc;

use rustyline::{DefaultEditor, error::ReadlineError};
use serde_json::Map;
use tayori_server::infrastructure::dto::websocket::ChatMessage;
use tayori_shared::time::{get_timestamp_millis, now_rfc3339};
use tokio::sync::{broadcast, mpsc};

use crate::{
    adapter::RelayClient,
    command::{Command, HELP, parse_command},
    config::ReconnectPolicy,
    domain::ConnectionState,
    error::ClientError,
};

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

/// Run the CLI until the user quits
///
/// # Arguments
///
/// * `url` - WebSocket URL of the relay
/// * `user_id` - Identity announced with `user:online`
/// * `rooms` - Rooms joined on start; the last one becomes the current room
/// * `policy` - Reconnection policy of the adapter
pub async fn run_client(
    url: String,
    user_id: String,
    rooms: Vec<String>,
    policy: ReconnectPolicy,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(RelayClient::new(url, policy));
    let prompt = format!("{}> ", user_id);

    // Subscribe before connecting so no event is missed
    let mut events = client.subscribe();

    if !client.go_online(&user_id).await {
        return Err(Box::new(ClientError::NotConnected));
    }
    for room_id in &rooms {
        client.join_room(room_id).await;
    }
    let mut current_room = rooms.last().cloned();

    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Type /help for commands.\n",
        user_id
    );
    if let Some(room_id) = &current_room {
        println!("Current room: #{}\n", room_id);
    }

    // Spawn a task to print incoming events
    let user_id_for_print = user_id.clone();
    let prompt_for_print = prompt.clone();
    let print_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    print!(
                        "{}",
                        MessageFormatter::format_event(&event, &user_id_for_print)
                    );
                    redisplay_prompt(&prompt_for_print);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Skipped {} event(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Spawn a task to report connection loss
    let mut state_rx = client.watch_state();
    let prompt_for_state = prompt.clone();
    let state_task = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            if *state_rx.borrow_and_update() == ConnectionState::Disconnected {
                println!("\n! Connection lost. It will be re-established on your next action.");
                redisplay_prompt(&prompt_for_state);
            }
        }
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_for_readline = prompt.clone();
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt_for_readline) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Say(content) => {
                let Some(room_id) = &current_room else {
                    println!("Join a room first: /join <room>");
                    continue;
                };
                // Persistence Gateway の代わりに ID と作成時刻を付与する
                let message = ChatMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    content,
                    created_at: now_rfc3339(),
                    sender_id: user_id.clone(),
                    extra: Map::new(),
                };
                let created_at = message.created_at.clone();
                if client.send_message(room_id, message).await {
                    print!(
                        "{}",
                        MessageFormatter::format_sent_confirmation(room_id, &created_at)
                    );
                } else {
                    println!("Not connected, message was not sent");
                }
            }
            Command::Join(room_id) => {
                if client.join_room(&room_id).await {
                    println!("Joined #{}", room_id);
                } else {
                    println!("Not connected, #{} will be joined on reconnect", room_id);
                }
                current_room = Some(room_id);
            }
            Command::Leave(room_id) => {
                client.leave_room(&room_id).await;
                if current_room.as_deref() == Some(room_id.as_str()) {
                    current_room = client.joined_rooms().await.pop();
                }
                println!("Left #{}", room_id);
            }
            Command::Typing { to_user_id, typing } => {
                if !client.set_typing(&user_id, &to_user_id, typing).await {
                    println!("Not connected, typing signal was not sent");
                }
            }
            Command::Offline => {
                if client.go_offline(Some(get_timestamp_millis())).await {
                    println!("You are offline on this connection");
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    client.disconnect().await;
    print_task.abort();
    state_task.abort();
    tracing::info!("Client session ended");

    Ok(())
}
