//! Domain 層のエラー型
//!
//! クライアントへそのまま返すメッセージは各 variant の Display に持たせる。

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 空文字列（トリム後に空になる場合を含む）
    #[error("{0} must not be empty")]
    Empty(&'static str),
    /// 最大長超過
    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
}

/// ルーム操作のエラー
///
/// Display はクライアントへ返す ack のメッセージ文字列として使う。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room does not exist")]
    RoomNotFound,
    #[error("Room already exists")]
    RoomAlreadyExists,
    #[error("Invalid passcode")]
    InvalidPasscode,
    #[error("You are not in this room")]
    NotAMember,
}

/// ファイル共有通知のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNoticeError {
    #[error("User not found")]
    MissingIdentity,
    #[error("You are not in this room")]
    NotInRoom,
    #[error("You are not in this private room")]
    NotInPrivateRoom,
}

/// メッセージ送信（push）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信先のクライアントが登録されていない
    #[error("client not found: {0}")]
    ClientNotFound(String),
    /// チャンネルへの送信自体に失敗した
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// ミーティング管理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeetingError {
    #[error("Meeting not found")]
    NotFound,
    #[error("Title and start time are required")]
    MissingField,
}
