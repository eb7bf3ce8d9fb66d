//! Domain 層のエンティティ
//!
//! 接続・ルーム・タイピングレース・ミーティングのモデルを定義する。
//! 可変状態の集約と操作の調停は `hub` モジュールが担う。

use std::collections::HashMap;

use serde_json::Value;

use super::value_object::{ConnectionId, Passcode, Progress, RoomId, Timestamp, Username};

/// 1 本の WebSocket 接続のセッション状態（Domain Model）
#[derive(Debug, Clone)]
pub struct Connection {
    /// サーバーが採番した接続 ID
    pub id: ConnectionId,
    /// `join` / `createPrivateRoom` などで申告されたユーザー名
    pub username: Option<Username>,
    /// 現在参加中の公開ルーム（高々 1 つ）
    pub public_room: Option<RoomId>,
    /// `join-meeting` で申告されたユーザー情報（中身はクライアント定義）
    pub meeting_user: Option<Value>,
    /// 接続時刻
    pub connected_at: Timestamp,
}

impl Connection {
    /// 新しい Connection を作成
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            username: None,
            public_room: None,
            meeting_user: None,
            connected_at,
        }
    }

    /// 表示名（ユーザー名未設定なら ID 末尾からのプレースホルダ）
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(name) => name.as_str().to_string(),
            None => self.id.placeholder_name(),
        }
    }
}

/// ルームの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// 公開チャットルーム（`join` で参加）
    Public,
    /// パスコード付きプライベートルーム
    Private,
    /// ミーティング（WebRTC シグナリングの宛先解決に使う）
    Meeting,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Public => "public",
            RoomKind::Private => "private",
            RoomKind::Meeting => "meeting",
        }
    }
}

/// チャットルーム（Domain Model）
///
/// メンバーは参加順を保持し、重複は持たない。
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    /// 参加順のメンバーリスト（重複なし）
    pub members: Vec<ConnectionId>,
    /// プライベートルームのみ Some
    pub passcode: Option<Passcode>,
    pub created_by: ConnectionId,
    pub created_at: Timestamp,
}

impl Room {
    /// 新しい Room を作成（パスコードなし）
    pub fn new(
        id: RoomId,
        kind: RoomKind,
        created_by: ConnectionId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            members: Vec::new(),
            passcode: None,
            created_by,
            created_at,
        }
    }

    /// パスコード付きの新しい Room を作成
    pub fn with_passcode(
        id: RoomId,
        kind: RoomKind,
        passcode: Passcode,
        created_by: ConnectionId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            members: Vec::new(),
            passcode: Some(passcode),
            created_by,
            created_at,
        }
    }

    /// メンバーを追加する
    ///
    /// すでにメンバーであれば何もせず `false` を返す。
    pub fn add_member(&mut self, connection_id: ConnectionId) -> bool {
        if self.is_member(&connection_id) {
            return false;
        }
        self.members.push(connection_id);
        true
    }

    /// メンバーを削除する
    ///
    /// メンバーでなければ何もせず `false` を返す。
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| id != connection_id);
        self.members.len() != before
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// タイピングレースの参加者（Domain Model）
#[derive(Debug, Clone)]
pub struct RacePlayer {
    pub id: ConnectionId,
    pub username: Username,
    pub progress: Progress,
    pub wpm: f64,
    pub accuracy: f64,
}

impl RacePlayer {
    /// レース参加直後の初期状態（進捗 0、WPM 0、正確さ 0）
    pub fn new(id: ConnectionId, username: Username) -> Self {
        Self {
            id,
            username,
            progress: Progress::new(0.0),
            wpm: 0.0,
            accuracy: 0.0,
        }
    }
}

/// タイピングレースのセッション（サーバー全体で 1 つ）
///
/// 勝者は 1 レース（エポック）につき 1 人だけ確定する。全プレイヤーが
/// いなくなったあとの最初の参加で新しいエポックが始まる。
#[derive(Debug, Clone)]
pub struct RaceSession {
    /// 全プレイヤーが写経する課題文
    pub paragraph: String,
    players: HashMap<ConnectionId, RacePlayer>,
    winner: Option<ConnectionId>,
}

impl RaceSession {
    /// 既定の課題文
    pub const DEFAULT_PARAGRAPH: &'static str = "The quick brown fox jumps over the lazy dog.";

    pub fn new() -> Self {
        Self {
            paragraph: Self::DEFAULT_PARAGRAPH.to_string(),
            players: HashMap::new(),
            winner: None,
        }
    }

    /// プレイヤーを参加させる
    ///
    /// プレイヤーが誰もいない状態からの参加で勝者をリセットし、
    /// 新しいエポックを開始する。再参加は進捗をリセットして上書きする。
    pub fn join(&mut self, id: ConnectionId, username: Username) {
        if self.players.is_empty() {
            self.winner = None;
        }
        self.players
            .insert(id.clone(), RacePlayer::new(id, username));
    }

    /// 進捗を更新する
    ///
    /// レースに参加していなければ `None`。このエポックで初めて 100% に
    /// 到達したプレイヤーがいれば `Some(Some(username))` を返す。
    pub fn update_progress(
        &mut self,
        id: &ConnectionId,
        progress: Progress,
        wpm: f64,
        accuracy: f64,
    ) -> Option<Option<Username>> {
        let player = self.players.get_mut(id)?;
        player.progress = progress;
        player.wpm = wpm;
        player.accuracy = accuracy;

        if progress.is_complete() && self.winner.is_none() {
            self.winner = Some(id.clone());
            return Some(Some(player.username.clone()));
        }
        Some(None)
    }

    /// プレイヤーを取り除く（参加していなければ `false`）
    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        self.players.remove(id).is_some()
    }

    pub fn has_player(&self, id: &ConnectionId) -> bool {
        self.players.contains_key(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// 全プレイヤーのスナップショット（接続 ID 順）
    pub fn snapshot(&self) -> Vec<RacePlayer> {
        let mut players: Vec<RacePlayer> = self.players.values().cloned().collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));
        players
    }
}

impl Default for RaceSession {
    fn default() -> Self {
        Self::new()
    }
}

/// ランダムマッチで成立したペア
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPair {
    /// 先にキューへ並んでいた側
    pub first: ConnectionId,
    pub second: ConnectionId,
}

impl MatchPair {
    /// ペア専用のルーム ID ラベル（`{first}-{second}`）
    ///
    /// 実際のルームは作らず、以降の 1:1 シグナリングの合言葉として使う。
    pub fn room_label(&self) -> String {
        format!("{}-{}", self.first, self.second)
    }
}

/// ミーティングのメタデータ（Domain Model）
///
/// WebSocket のミーティングルームとは独立に、HTTP API で作成・参照される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub id: String,
    pub title: String,
    pub description: String,
    /// 開始予定時刻（クライアント申告の文字列をそのまま保持）
    pub start_at: String,
    pub host: String,
    /// 招待リンクのスラッグ
    pub link: String,
    pub created_at: Timestamp,
}

/// ミーティング作成の入力（検証・デフォルト適用済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDraft {
    pub title: String,
    pub description: String,
    pub start_at: String,
    pub host: String,
}
