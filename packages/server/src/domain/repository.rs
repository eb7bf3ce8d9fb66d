//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use serde_json::Value;

use super::entity::{MatchPair, Meeting, MeetingDraft};
use super::error::{FileNoticeError, MeetingError, RoomError};
use super::hub::{
    ConnectOutcome, DisconnectOutcome, FileNoticeOutcome, HubStats, MeetingJoinOutcome,
    MeetingLeaveOutcome, OnlineUser, PrivateJoinOutcome, PrivateLeaveOutcome,
    PrivateMessageOutcome, PublicJoinOutcome, PublicMessageOutcome, RaceJoinOutcome,
    RaceProgressOutcome, RoomSummary, StaleTypingEntry, TypingOutcome,
};
use super::value_object::{ConnectionId, Passcode, Progress, RoomId, Timestamp, Username};

/// Hub Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には
/// 依存しない。
///
/// ## 依存性の逆転（DIP）
///
/// - ドメイン層が必要とするインターフェースをドメイン層自身が定義
/// - Infrastructure 層がドメイン層のインターフェースに依存
/// - ドメイン層は Infrastructure 層に依存しない
///
/// ## アトミシティ
///
/// 各メソッドは Hub 集約への 1 回の排他アクセスとして実装されることを
/// 想定している。判定・状態更新・通知先のスナップショット取得を 1 回の
/// 呼び出しで終えるため、並行イベントが割り込んでも Outcome の整合性が
/// 崩れない。
#[async_trait]
pub trait HubRepository: Send + Sync {
    /// 接続を登録
    async fn register_connection(
        &self,
        id: ConnectionId,
        connected_at: Timestamp,
    ) -> ConnectOutcome;

    /// 接続の後片付け（キュー・レース・タイピング・ルーム・レジストリ）
    async fn disconnect(&self, id: &ConnectionId) -> DisconnectOutcome;

    /// 公開ルームに参加（名乗りの確定と直前ルームからの自動退出を含む）
    async fn join_public_room(
        &self,
        id: &ConnectionId,
        room_id: RoomId,
        username: Username,
        now: Timestamp,
    ) -> Option<PublicJoinOutcome>;

    /// プライベートルームを作成
    async fn create_private_room(
        &self,
        id: &ConnectionId,
        room_id: RoomId,
        passcode: Passcode,
        username: Username,
        now: Timestamp,
    ) -> Result<(), RoomError>;

    /// プライベートルームに参加
    async fn join_private_room(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
        passcode: &Passcode,
        username: Option<Username>,
    ) -> Result<PrivateJoinOutcome, RoomError>;

    /// プライベートルームから退出
    async fn leave_private_room(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<PrivateLeaveOutcome>;

    /// ミーティングルームに参加
    async fn join_meeting_room(
        &self,
        id: &ConnectionId,
        meeting_id: RoomId,
        user: Option<Value>,
        now: Timestamp,
    ) -> Option<MeetingJoinOutcome>;

    /// ミーティングルームから退出
    async fn leave_meeting_room(
        &self,
        id: &ConnectionId,
        meeting_id: &RoomId,
    ) -> Option<MeetingLeaveOutcome>;

    /// 公開チャットメッセージの宛先を解決
    async fn public_message_targets(&self, id: &ConnectionId) -> Option<PublicMessageOutcome>;

    /// プライベートメッセージの宛先を解決
    async fn private_message_targets(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<PrivateMessageOutcome, RoomError>;

    /// ミーティングイベントの宛先を解決
    async fn meeting_targets(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// 接続に保存されたミーティングユーザー情報を取得
    async fn meeting_user(&self, id: &ConnectionId) -> Option<Value>;

    /// ファイル共有通知の宛先を解決
    async fn file_notice_targets(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
        is_private: bool,
    ) -> Result<FileNoticeOutcome, FileNoticeError>;

    /// タイピング中として記録
    async fn set_typing(
        &self,
        id: &ConnectionId,
        room: Option<RoomId>,
        now: Timestamp,
    ) -> Option<TypingOutcome>;

    /// タイピング中状態を解除
    async fn clear_typing(&self, id: &ConnectionId, room: Option<RoomId>)
        -> Option<TypingOutcome>;

    /// 失効したタイピング中状態を掃除
    async fn sweep_stale_typing(&self, now: Timestamp, ttl_millis: i64) -> Vec<StaleTypingEntry>;

    /// マッチングキューに追加し、揃えばペアを返す
    async fn enqueue_for_match(&self, id: &ConnectionId) -> Option<MatchPair>;

    /// タイピングレースに参加
    async fn join_race(&self, id: &ConnectionId, username: Username) -> Option<RaceJoinOutcome>;

    /// タイピングレースの進捗を更新
    async fn update_race_progress(
        &self,
        id: &ConnectionId,
        progress: Progress,
        wpm: f64,
        accuracy: f64,
    ) -> Option<RaceProgressOutcome>;

    /// オンラインユーザーの一覧を取得
    async fn online_users(&self) -> Vec<OnlineUser>;

    /// アクティブなルームの概要を取得
    async fn rooms_summary(&self) -> Vec<RoomSummary>;

    /// Hub 全体の統計を取得
    async fn stats(&self) -> HubStats;
}

/// Meeting Store trait
///
/// HTTP API で作成されるミーティングメタデータの永続化インターフェース。
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// ミーティングを作成し、採番済みのエンティティを返す
    async fn create_meeting(&self, draft: MeetingDraft) -> Meeting;

    /// ミーティングを ID で取得
    async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, MeetingError>;
}
