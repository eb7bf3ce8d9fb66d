//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    ConnectSessionUseCase, DisconnectSessionUseCase, JoinRoomUseCase, MatchmakingUseCase,
    MeetingUseCase, PresenceUseCase, PrivateRoomUseCase, SendMessageUseCase, SignalingUseCase,
    TypingRaceUseCase,
};

use super::{
    handler::{create_meeting, debug_hub, get_meeting, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// 放置された typing 表示を掃除する周期
const TYPING_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// WebSocket communication hub server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_session_usecase,
///     disconnect_session_usecase,
///     join_room_usecase,
///     private_room_usecase,
///     send_message_usecase,
///     presence_usecase,
///     signaling_usecase,
///     matchmaking_usecase,
///     typing_race_usecase,
///     meeting_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ConnectSessionUseCase（接続受け入れのユースケース）
    connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（切断処理のユースケース）
    disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// JoinRoomUseCase（公開ルーム参加のユースケース）
    join_room_usecase: Arc<JoinRoomUseCase>,
    /// PrivateRoomUseCase（プライベートルーム管理のユースケース）
    private_room_usecase: Arc<PrivateRoomUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    send_message_usecase: Arc<SendMessageUseCase>,
    /// PresenceUseCase（在席・タイピング表示のユースケース）
    presence_usecase: Arc<PresenceUseCase>,
    /// SignalingUseCase（WebRTC シグナリング中継のユースケース）
    signaling_usecase: Arc<SignalingUseCase>,
    /// MatchmakingUseCase（ランダムマッチングのユースケース）
    matchmaking_usecase: Arc<MatchmakingUseCase>,
    /// TypingRaceUseCase（タイピングレースのユースケース）
    typing_race_usecase: Arc<TypingRaceUseCase>,
    /// MeetingUseCase（ミーティング管理のユースケース）
    meeting_usecase: Arc<MeetingUseCase>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `connect_session_usecase` - UseCase for accepting connections
    /// * `disconnect_session_usecase` - UseCase for connection teardown
    /// * `join_room_usecase` - UseCase for joining public rooms
    /// * `private_room_usecase` - UseCase for private room management
    /// * `send_message_usecase` - UseCase for message sending
    /// * `presence_usecase` - UseCase for presence and typing indicators
    /// * `signaling_usecase` - UseCase for WebRTC signaling relay
    /// * `matchmaking_usecase` - UseCase for the random match queue
    /// * `typing_race_usecase` - UseCase for the typing race
    /// * `meeting_usecase` - UseCase for meeting rooms and metadata
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connect_session_usecase: Arc<ConnectSessionUseCase>,
        disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
        join_room_usecase: Arc<JoinRoomUseCase>,
        private_room_usecase: Arc<PrivateRoomUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        presence_usecase: Arc<PresenceUseCase>,
        signaling_usecase: Arc<SignalingUseCase>,
        matchmaking_usecase: Arc<MatchmakingUseCase>,
        typing_race_usecase: Arc<TypingRaceUseCase>,
        meeting_usecase: Arc<MeetingUseCase>,
    ) -> Self {
        Self {
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
        }
    }

    /// Run the communication hub server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            connect_session_usecase: self.connect_session_usecase,
            disconnect_session_usecase: self.disconnect_session_usecase,
            join_room_usecase: self.join_room_usecase,
            private_room_usecase: self.private_room_usecase,
            send_message_usecase: self.send_message_usecase,
            presence_usecase: self.presence_usecase,
            signaling_usecase: self.signaling_usecase,
            matchmaking_usecase: self.matchmaking_usecase,
            typing_race_usecase: self.typing_race_usecase,
            meeting_usecase: self.meeting_usecase,
        });

        // TTL を過ぎた typing 表示を定期的に消す
        let presence = app_state.presence_usecase.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TYPING_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                presence.sweep_stale().await;
            }
        });

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/debug/hub", get(debug_hub))
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/meetings", post(create_meeting))
            .route("/api/meetings/{meeting_id}", get(get_meeting))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "WebSocket communication hub listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
