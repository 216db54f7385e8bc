//! Tayori relay CLI client.
//!
//! Connects to the relay, announces the given user, joins rooms and sends
//! typed lines as chat messages. Reconnects on demand, rejoining the same
//! rooms (max 5 attempts with 5 second interval by default).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tayori-client -- --user-id alice --room general
//! cargo run --bin tayori-client -- -i bob -r general -r random
//! ```

use std::time::Duration;

use clap::Parser;

use tayori_client::{ReconnectPolicy, run_client};
use tayori_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tayori-client")]
#[command(about = "CLI client for the Tayori realtime relay", long_about = None)]
struct Args {
    /// User ID announced to the relay
    #[arg(short = 'i', long)]
    user_id: String,

    /// WebSocket URL of the relay
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// Room to join on start (repeatable)
    #[arg(short = 'r', long = "room")]
    rooms: Vec<String>,

    /// Maximum connection attempts before giving up
    #[arg(long, default_value = "5")]
    max_attempts: u32,

    /// Seconds to wait between connection attempts
    #[arg(long, default_value = "5")]
    retry_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let policy = ReconnectPolicy::new(
        args.max_attempts,
        Duration::from_secs(args.retry_interval_secs),
    );

    // Run the client
    if let Err(e) = run_client(args.url, args.user_id, args.rooms, policy).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
