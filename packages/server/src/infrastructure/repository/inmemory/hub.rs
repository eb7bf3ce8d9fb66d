//! InMemory Hub Repository 実装
//!
//! ドメイン層が定義する HubRepository trait の具体的な実装。
//! `Mutex<Hub>` をインメモリ DB として使用します。
//!
//! ## アトミシティ
//!
//! 各メソッドはロックを 1 回だけ取得し、判定・状態更新・通知先の
//! スナップショット取得を済ませてから解放する。ロック保持中に I/O や
//! await は行わない。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectOutcome, ConnectionId, DisconnectOutcome, FileNoticeError, FileNoticeOutcome, Hub,
    HubRepository, HubStats, MatchPair, MeetingJoinOutcome, MeetingLeaveOutcome, OnlineUser,
    Passcode, PrivateJoinOutcome, PrivateLeaveOutcome, PrivateMessageOutcome, Progress,
    PublicJoinOutcome, PublicMessageOutcome, RaceJoinOutcome, RaceProgressOutcome, RoomError,
    RoomId, RoomSummary, StaleTypingEntry, Timestamp, TypingOutcome, Username,
};

/// インメモリ Hub Repository 実装
///
/// Hub 集約を保持し、ドメイン層の HubRepository trait を実装します（依存性の逆転）。
pub struct InMemoryHubRepository {
    hub: Arc<Mutex<Hub>>,
}

impl InMemoryHubRepository {
    /// 新しい InMemoryHubRepository を作成
    pub fn new() -> Self {
        Self {
            hub: Arc::new(Mutex::new(Hub::new())),
        }
    }
}

impl Default for InMemoryHubRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HubRepository for InMemoryHubRepository {
    async fn register_connection(
        &self,
        id: ConnectionId,
        connected_at: Timestamp,
    ) -> ConnectOutcome {
        let mut hub = self.hub.lock().await;
        hub.register_connection(id, connected_at)
    }

    async fn disconnect(&self, id: &ConnectionId) -> DisconnectOutcome {
        let mut hub = self.hub.lock().await;
        hub.disconnect(id)
    }

    async fn join_public_room(
        &self,
        id: &ConnectionId,
        room_id: RoomId,
        username: Username,
        now: Timestamp,
    ) -> Option<PublicJoinOutcome> {
        let mut hub = self.hub.lock().await;
        hub.join_public_room(id, room_id, username, now)
    }

    async fn create_private_room(
        &self,
        id: &ConnectionId,
        room_id: RoomId,
        passcode: Passcode,
        username: Username,
        now: Timestamp,
    ) -> Result<(), RoomError> {
        let mut hub = self.hub.lock().await;
        hub.create_private_room(id, room_id, passcode, username, now)
    }

    async fn join_private_room(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
        passcode: &Passcode,
        username: Option<Username>,
    ) -> Result<PrivateJoinOutcome, RoomError> {
        let mut hub = self.hub.lock().await;
        hub.join_private_room(id, room_id, passcode, username)
    }

    async fn leave_private_room(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<PrivateLeaveOutcome> {
        let mut hub = self.hub.lock().await;
        hub.leave_private_room(id, room_id)
    }

    async fn join_meeting_room(
        &self,
        id: &ConnectionId,
        meeting_id: RoomId,
        user: Option<Value>,
        now: Timestamp,
    ) -> Option<MeetingJoinOutcome> {
        let mut hub = self.hub.lock().await;
        hub.join_meeting_room(id, meeting_id, user, now)
    }

    async fn leave_meeting_room(
        &self,
        id: &ConnectionId,
        meeting_id: &RoomId,
    ) -> Option<MeetingLeaveOutcome> {
        let mut hub = self.hub.lock().await;
        hub.leave_meeting_room(id, meeting_id)
    }

    async fn public_message_targets(&self, id: &ConnectionId) -> Option<PublicMessageOutcome> {
        let hub = self.hub.lock().await;
        hub.public_message_targets(id)
    }

    async fn private_message_targets(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<PrivateMessageOutcome, RoomError> {
        let hub = self.hub.lock().await;
        hub.private_message_targets(id, room_id)
    }

    async fn meeting_targets(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let hub = self.hub.lock().await;
        hub.meeting_targets(room_id)
    }

    async fn meeting_user(&self, id: &ConnectionId) -> Option<Value> {
        let hub = self.hub.lock().await;
        hub.meeting_user(id)
    }

    async fn file_notice_targets(
        &self,
        id: &ConnectionId,
        room_id: &RoomId,
        is_private: bool,
    ) -> Result<FileNoticeOutcome, FileNoticeError> {
        let hub = self.hub.lock().await;
        hub.file_notice_targets(id, room_id, is_private)
    }

    async fn set_typing(
        &self,
        id: &ConnectionId,
        room: Option<RoomId>,
        now: Timestamp,
    ) -> Option<TypingOutcome> {
        let mut hub = self.hub.lock().await;
        hub.set_typing(id, room, now)
    }

    async fn clear_typing(
        &self,
        id: &ConnectionId,
        room: Option<RoomId>,
    ) -> Option<TypingOutcome> {
        let mut hub = self.hub.lock().await;
        hub.clear_typing(id, room)
    }

    async fn sweep_stale_typing(&self, now: Timestamp, ttl_millis: i64) -> Vec<StaleTypingEntry> {
        let mut hub = self.hub.lock().await;
        hub.sweep_stale_typing(now, ttl_millis)
    }

    async fn enqueue_for_match(&self, id: &ConnectionId) -> Option<MatchPair> {
        let mut hub = self.hub.lock().await;
        hub.enqueue_for_match(id)
    }

    async fn join_race(&self, id: &ConnectionId, username: Username) -> Option<RaceJoinOutcome> {
        let mut hub = self.hub.lock().await;
        hub.join_race(id, username)
    }

    async fn update_race_progress(
        &self,
        id: &ConnectionId,
        progress: Progress,
        wpm: f64,
        accuracy: f64,
    ) -> Option<RaceProgressOutcome> {
        let mut hub = self.hub.lock().await;
        hub.update_race_progress(id, progress, wpm, accuracy)
    }

    async fn online_users(&self) -> Vec<OnlineUser> {
        let hub = self.hub.lock().await;
        hub.online_users()
    }

    async fn rooms_summary(&self) -> Vec<RoomSummary> {
        let hub = self.hub.lock().await;
        hub.rooms_summary()
    }

    async fn stats(&self) -> HubStats {
        let hub = self.hub.lock().await;
        hub.stats()
    }
}
