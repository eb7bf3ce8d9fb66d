//! Domain 層の値オブジェクト
//!
//! 接続 ID・ユーザー名・ルーム ID・パスコードなど、検証付きの
//! プリミティブを定義する。不正な値はコンストラクタで弾き、
//! 以降の層では常に検証済みの値だけが流れるようにする。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// 接続 ID の最大長
const CONNECTION_ID_MAX_LENGTH: usize = 64;
/// ユーザー名の最大長
const USERNAME_MAX_LENGTH: usize = 32;
/// ルーム ID の最大長
const ROOM_ID_MAX_LENGTH: usize = 64;
/// パスコードの最大長
const PASSCODE_MAX_LENGTH: usize = 64;

/// WebSocket 接続ごとにサーバーが採番する ID（Domain Model）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// 新しい ConnectionId を作成（検証付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty("connection id"));
        }
        if value.chars().count() > CONNECTION_ID_MAX_LENGTH {
            return Err(ValidationError::TooLong(
                "connection id",
                CONNECTION_ID_MAX_LENGTH,
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 表示用のフォールバック名（`User` + ID 末尾 4 文字)
    ///
    /// ユーザー名未設定の接続をルーム一覧などに出すときに使う。
    pub fn placeholder_name(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("User{tail}")
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ConnectionId の採番ファクトリ
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// UUID v4 で新しい ConnectionId を採番
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4().to_string())
    }
}

/// チャット参加者のユーザー名（Domain Model）
///
/// 前後の空白はトリムして保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// 新しい Username を作成（検証付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty("username"));
        }
        if trimmed.chars().count() > USERNAME_MAX_LENGTH {
            return Err(ValidationError::TooLong("username", USERNAME_MAX_LENGTH));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// チャットルーム・ミーティングルームの ID（Domain Model)
///
/// 公開ルーム・プライベートルーム・ミーティングは同じ名前空間を共有する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// 新しい RoomId を作成（検証付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty("room id"));
        }
        if value.chars().count() > ROOM_ID_MAX_LENGTH {
            return Err(ValidationError::TooLong("room id", ROOM_ID_MAX_LENGTH));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// プライベートルームのパスコード（Domain Model）
///
/// 照合は完全一致のみ。正規化やハッシュ化は行わない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passcode(String);

impl Passcode {
    /// 新しい Passcode を作成（検証付き）
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty("passcode"));
        }
        if value.chars().count() > PASSCODE_MAX_LENGTH {
            return Err(ValidationError::TooLong("passcode", PASSCODE_MAX_LENGTH));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// タイピングレースの進捗率（0.0〜100.0 に丸める）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Progress(f64);

impl Progress {
    /// 新しい Progress を作成
    ///
    /// 範囲外の値は 0.0〜100.0 に丸める。NaN や無限大は 0.0 として扱う。
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 100.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// レース完走（100% 到達）か
    pub fn is_complete(&self) -> bool {
        self.0 >= 100.0
    }
}

/// UNIX エポックからのミリ秒タイムスタンプ（Domain Model）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
