//! UseCase 層
//!
//! コンポーネントごとに 1 つのユースケース構造体を置く。各ユースケースは
//! `HubRepository` / `MessagePusher`（必要なら `Clock`・`MeetingStore`）を
//! `Arc<dyn …>` で受け取り、「Repository で状態遷移 → Outcome の宛先へ
//! push/broadcast」という一方向の流れだけを持つ。
//!
//! 通知の失敗は原則として握りつぶす（警告ログのみ）。切断直後の接続が
//! 宛先に残っているのは正常系であり、送信者へエラーを返すのは
//! ack を仕様に持つ操作だけ。

pub mod connect_session;
pub mod disconnect_session;
pub mod join_room;
pub mod matchmaking;
pub mod meeting;
pub mod presence;
pub mod private_room;
pub mod send_message;
pub mod signaling;
pub mod typing_race;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use join_room::JoinRoomUseCase;
pub use matchmaking::MatchmakingUseCase;
pub use meeting::MeetingUseCase;
pub use presence::{PresenceUseCase, TYPING_TTL_MILLIS};
pub use private_room::PrivateRoomUseCase;
pub use send_message::SendMessageUseCase;
pub use signaling::SignalingUseCase;
pub use typing_race::TypingRaceUseCase;

/// Admin 通知の送信者名（welcome / joined / left の各通知）
pub(crate) const ADMIN_USER: &str = "Admin";

/// 配信イベントの一意 ID を採番する
///
/// チャットメッセージ・ファイル通知など `id` を持つイベントで使う。
pub(crate) fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
