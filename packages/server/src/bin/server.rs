//! Realtime communication hub server.
//!
//! Group chat rooms, passcode-protected private rooms, WebRTC signaling for
//! calls and meetings, random matchmaking and a typing race over one
//! WebSocket endpoint, plus a small HTTP API for meeting metadata.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-server
//! cargo run --bin idobata-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use idobata_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryHubRepository, InMemoryMeetingStore},
    },
    ui::Server,
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, JoinRoomUseCase, MatchmakingUseCase,
        MeetingUseCase, PresenceUseCase, PrivateRoomUseCase, SendMessageUseCase, SignalingUseCase,
        TypingRaceUseCase,
    },
};
use idobata_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Realtime communication hub server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository / MeetingStore
    // 2. MessagePusher
    // 3. Clock
    // 4. UseCases
    // 5. Server

    // 1. Create Repository and MeetingStore (in-memory database)
    let repository = Arc::new(InMemoryHubRepository::new());
    let meeting_store = Arc::new(InMemoryMeetingStore::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create Clock (system time)
    let clock = Arc::new(SystemClock);

    // 4. Create UseCases
    let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let private_room_usecase = Arc::new(PrivateRoomUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let presence_usecase = Arc::new(PresenceUseCase::new(
        repository.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let signaling_usecase = Arc::new(SignalingUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let matchmaking_usecase = Arc::new(MatchmakingUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let typing_race_usecase = Arc::new(TypingRaceUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let meeting_usecase = Arc::new(MeetingUseCase::new(
        repository.clone(),
        meeting_store.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));

    // 5. Create and run the server
    let server = Server::new(
        connect_session_usecase,
        disconnect_session_usecase,
        join_room_usecase,
        private_room_usecase,
        send_message_usecase,
        presence_usecase,
        signaling_usecase,
        matchmaking_usecase,
        typing_race_usecase,
        meeting_usecase,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
