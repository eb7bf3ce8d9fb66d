//! Server state shared across handlers.

use std::sync::Arc;

use crate::usecase::{
    ConnectSessionUseCase, DisconnectSessionUseCase, JoinRoomUseCase, MatchmakingUseCase,
    MeetingUseCase, PresenceUseCase, PrivateRoomUseCase, SendMessageUseCase, SignalingUseCase,
    TypingRaceUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectSessionUseCase（接続受け入れのユースケース）
    pub connect_session_usecase: Arc<ConnectSessionUseCase>,
    /// DisconnectSessionUseCase（切断処理のユースケース）
    pub disconnect_session_usecase: Arc<DisconnectSessionUseCase>,
    /// JoinRoomUseCase（公開ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// PrivateRoomUseCase（プライベートルーム管理のユースケース）
    pub private_room_usecase: Arc<PrivateRoomUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// PresenceUseCase（在席・タイピング表示のユースケース）
    pub presence_usecase: Arc<PresenceUseCase>,
    /// SignalingUseCase（WebRTC シグナリング中継のユースケース）
    pub signaling_usecase: Arc<SignalingUseCase>,
    /// MatchmakingUseCase（ランダムマッチングのユースケース）
    pub matchmaking_usecase: Arc<MatchmakingUseCase>,
    /// TypingRaceUseCase（タイピングレースのユースケース）
    pub typing_race_usecase: Arc<TypingRaceUseCase>,
    /// MeetingUseCase（ミーティング管理のユースケース）
    pub meeting_usecase: Arc<MeetingUseCase>,
}
