//! CLI client for the Idobata communication hub.
//!
//! Connects to the hub, joins a chat room and sends stdin lines as chat
//! messages. Slash commands drive private rooms, the match queue and the
//! typing race (`/help` lists them). Automatically reconnects on
//! disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-client -- --username Alice
//! cargo run --bin idobata-client -- -n Bob -r general
//! ```

use clap::Parser;

use idobata_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "CLI client for the Idobata communication hub", long_about = None)]
struct Args {
    /// Display name used in chat rooms
    #[arg(short = 'n', long)]
    username: String,

    /// Chat room to join on connect
    #[arg(short = 'r', long, default_value = "general")]
    room: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = idobata_client::run_client(args.url, args.username, args.room).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
