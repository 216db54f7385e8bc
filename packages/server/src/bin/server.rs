//! Tayori realtime relay server.
//!
//! Tracks which users are online, which rooms each connection has joined,
//! and fans chat messages, presence and typing signals out over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tayori-server
//! cargo run --bin tayori-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tayori_server::{
    config::ServerConfig,
    infrastructure::message_pusher::WebSocketMessagePusher,
    ui::{AppState, Server},
    usecase::new_shared_relay,
};
use tayori_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tayori-server")]
#[command(about = "Realtime presence and message relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TAYORI_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TAYORI_PORT", default_value = "8080")]
    port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() {
    let config = ServerConfig::from(Args::parse());

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Initialize dependencies in order:
    // 1. Relay state
    // 2. MessagePusher
    // 3. UseCases (AppState)
    // 4. Server
    let relay = new_shared_relay();
    let message_pusher = Arc::new(WebSocketMessagePusher::default());
    let state = AppState::new(relay, message_pusher, Arc::new(SystemClock));

    let server = Server::new(state);
    if let Err(e) = server.run(&config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
