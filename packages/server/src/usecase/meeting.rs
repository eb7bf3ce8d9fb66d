//! UseCase: ミーティング（ルーム参加とメタデータ管理）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MeetingUseCase の join() / leave()（WebSocket 側のルーム）と
//!   create_meeting() / get_meeting()（HTTP 側のメタデータ）
//!
//! ### なぜこのテストが必要か
//! - participants スナップショットと peer-joined の宛先を取り違えると
//!   WebRTC のメッシュ確立が片方向になる
//! - メタデータの必須項目とデフォルト値は API 互換性そのもの
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の参加者（空のスナップショット）と 2 人目以降
//! - 正常系：タイトルと開始時刻だけの作成（デフォルト適用）
//! - エッジケース：必須項目欠落、存在しないミーティングの取得

use std::sync::Arc;

use idobata_shared::time::Clock;
use serde_json::Value;

use crate::domain::{
    ConnectionId, HubRepository, Meeting, MeetingDraft, MeetingError, MeetingStore, MessagePusher,
    RoomId, Timestamp,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// ホスト名未指定時のデフォルト
const DEFAULT_HOST: &str = "Anonymous Host";

/// ミーティングのユースケース
pub struct MeetingUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// ミーティングメタデータの保存先
    meeting_store: Arc<dyn MeetingStore>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Clock（現在時刻の抽象化）
    clock: Arc<dyn Clock>,
}

impl MeetingUseCase {
    /// 新しい MeetingUseCase を作成
    pub fn new(
        repository: Arc<dyn HubRepository>,
        meeting_store: Arc<dyn MeetingStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            meeting_store,
            message_pusher,
            clock,
        }
    }

    /// ミーティングルームに参加する
    ///
    /// `user` はクライアント定義のプロフィールで、サーバーは解釈しない。
    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        meeting_id: String,
        user: Option<Value>,
    ) {
        // 1. 入力を検証する（不正な ID は無視）
        let Ok(room_id) = RoomId::new(meeting_id) else {
            return;
        };

        // 2. ルームに参加し、参加時点の既存参加者を得る
        let joined_at = Timestamp::new(self.clock.now_ist_millis());
        let Some(outcome) = self
            .repository
            .join_meeting_room(connection_id, room_id.clone(), user.clone(), joined_at)
            .await
        else {
            tracing::debug!("Meeting join from unknown connection '{}'", connection_id);
            return;
        };

        // 3. 既存参加者に peer-joined を配信する
        let existing_ids: Vec<ConnectionId> =
            outcome.existing.iter().map(|p| p.id.clone()).collect();
        let joined = ServerEvent::PeerJoined {
            id: connection_id.as_str().to_string(),
            user,
        };
        if !existing_ids.is_empty() {
            if let Err(e) = self
                .message_pusher
                .broadcast(existing_ids, &joined.to_json())
                .await
            {
                tracing::warn!("Failed to broadcast peer-joined: {}", e);
            }
        }

        // 4. 本人に参加時点のスナップショットを送る（本人は含まれない）
        let participants = ServerEvent::Participants {
            participants: outcome.existing.into_iter().map(Into::into).collect(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &participants.to_json())
            .await
        {
            tracing::warn!("Failed to push participants to '{}': {}", connection_id, e);
        }

        tracing::info!("'{}' joined meeting '{}'", connection_id, room_id);
    }

    /// ミーティングルームから退出する
    pub async fn leave(&self, connection_id: &ConnectionId, meeting_id: String) {
        let Ok(room_id) = RoomId::new(meeting_id) else {
            return;
        };
        let Some(outcome) = self
            .repository
            .leave_meeting_room(connection_id, &room_id)
            .await
        else {
            return;
        };

        let event = ServerEvent::PeerLeft {
            id: connection_id.as_str().to_string(),
        };
        if outcome.remaining.is_empty() {
            return;
        }
        if let Err(e) = self
            .message_pusher
            .broadcast(outcome.remaining, &event.to_json())
            .await
        {
            tracing::warn!("Failed to broadcast peer-left: {}", e);
        }
    }

    /// ミーティングメタデータを作成する
    ///
    /// タイトルと開始時刻は必須。説明とホスト名は省略可能で、
    /// 省略時はそれぞれ空文字と既定のホスト名になる。
    pub async fn create_meeting(
        &self,
        title: Option<String>,
        description: Option<String>,
        start_at: Option<String>,
        host: Option<String>,
    ) -> Result<Meeting, MeetingError> {
        let title = title.map(|t| t.trim().to_string()).unwrap_or_default();
        let start_at = start_at.map(|s| s.trim().to_string()).unwrap_or_default();
        if title.is_empty() || start_at.is_empty() {
            return Err(MeetingError::MissingField);
        }

        let draft = MeetingDraft {
            title,
            description: description.unwrap_or_default(),
            start_at,
            host: host
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        };
        Ok(self.meeting_store.create_meeting(draft).await)
    }

    /// ミーティングメタデータを取得する
    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, MeetingError> {
        self.meeting_store.get_meeting(meeting_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryHubRepository, InMemoryMeetingStore},
    };
    use idobata_shared::time::FixedClock;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: MeetingUseCase,
        repository: Arc<InMemoryHubRepository>,
        pusher: Arc<WebSocketMessagePusher>,
    }

    fn create_fixture() -> Fixture {
        let repository = Arc::new(InMemoryHubRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = MeetingUseCase::new(
            repository.clone(),
            Arc::new(InMemoryMeetingStore::new()),
            pusher.clone(),
            Arc::new(FixedClock::new(1_672_511_400_000)),
        );
        Fixture {
            usecase,
            repository,
            pusher,
        }
    }

    async fn register(
        fixture: &Fixture,
        id: &str,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let connection_id = ConnectionId::new(id.to_string()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        fixture
            .pusher
            .register_client(connection_id.as_str().to_string(), tx)
            .await;
        fixture
            .repository
            .register_connection(connection_id.clone(), Timestamp::new(0))
            .await;
        (connection_id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) {
        while rx.try_recv().is_ok() {}
    }

    fn collect(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut events = Vec::new();
        while let Ok(raw) = rx.try_recv() {
            events.push(serde_json::from_str(&raw).unwrap());
        }
        events
    }

    #[tokio::test]
    async fn test_first_participant_gets_empty_snapshot() {
        // テスト項目: 最初の参加者に空の participants が届く
        // given (前提条件):
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;

        // when (操作):
        fixture
            .usecase
            .join(
                &alice,
                "standup".to_string(),
                Some(serde_json::json!({"name": "alice"})),
            )
            .await;

        // then (期待する結果):
        let events = collect(&mut alice_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "participants");
        assert_eq!(events[0]["participants"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_second_join_notifies_existing() {
        // テスト項目: 2 人目の参加で既存参加者に peer-joined が届く
        // given (前提条件): alice がミーティングにいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (bob, mut bob_rx) = register(&fixture, "conn-bob").await;
        fixture
            .usecase
            .join(
                &alice,
                "standup".to_string(),
                Some(serde_json::json!({"name": "alice"})),
            )
            .await;
        drain(&mut alice_rx);

        // when (操作):
        fixture
            .usecase
            .join(
                &bob,
                "standup".to_string(),
                Some(serde_json::json!({"name": "bob"})),
            )
            .await;

        // then (期待する結果): alice に peer-joined、bob に alice 入りの一覧
        let to_alice = collect(&mut alice_rx);
        assert_eq!(to_alice.len(), 1);
        assert_eq!(to_alice[0]["type"], "peer-joined");
        assert_eq!(to_alice[0]["id"], "conn-bob");
        assert_eq!(to_alice[0]["user"]["name"], "bob");

        let to_bob = collect(&mut bob_rx);
        assert_eq!(to_bob[0]["type"], "participants");
        let participants = to_bob[0]["participants"].as_array().unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0]["id"], "conn-alice");
        assert_eq!(participants[0]["user"]["name"], "alice");
    }

    #[tokio::test]
    async fn test_profileless_join_is_null_user() {
        // テスト項目: プロフィールなしの参加者は user が null になる
        // given (前提条件): alice がミーティングにいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (bob, _bob_rx) = register(&fixture, "conn-bob").await;
        fixture
            .usecase
            .join(&alice, "standup".to_string(), None)
            .await;
        drain(&mut alice_rx);

        // when (操作):
        fixture.usecase.join(&bob, "standup".to_string(), None).await;

        // then (期待する結果): user キーは存在して null
        let to_alice = collect(&mut alice_rx);
        assert_eq!(to_alice[0]["type"], "peer-joined");
        assert!(to_alice[0]["user"].is_null());
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining() {
        // テスト項目: 退出で残りの参加者に peer-left が届く
        // given (前提条件): alice と bob がミーティングにいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (bob, mut bob_rx) = register(&fixture, "conn-bob").await;
        fixture
            .usecase
            .join(&alice, "standup".to_string(), None)
            .await;
        fixture.usecase.join(&bob, "standup".to_string(), None).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作): bob が退出する
        fixture.usecase.leave(&bob, "standup".to_string()).await;

        // then (期待する結果):
        let to_alice = collect(&mut alice_rx);
        assert_eq!(to_alice.len(), 1);
        assert_eq!(to_alice[0]["type"], "peer-left");
        assert_eq!(to_alice[0]["id"], "conn-bob");
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_create_meeting_applies_defaults() {
        // テスト項目: 省略項目にデフォルトが適用される
        // given (前提条件):
        let fixture = create_fixture();

        // when (操作):
        let meeting = fixture
            .usecase
            .create_meeting(
                Some("Standup".to_string()),
                None,
                Some("2023-06-01T10:00:00Z".to_string()),
                None,
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(meeting.title, "Standup");
        assert_eq!(meeting.description, "");
        assert_eq!(meeting.host, "Anonymous Host");
        assert!(meeting.link.starts_with("meeting-"));
    }

    #[tokio::test]
    async fn test_create_meeting_requires_title_and_start() {
        // テスト項目: タイトルか開始時刻が無い作成は拒否される
        // given (前提条件):
        let fixture = create_fixture();

        // when (操作):
        let no_title = fixture
            .usecase
            .create_meeting(None, None, Some("2023-06-01T10:00:00Z".to_string()), None)
            .await;
        let blank_start = fixture
            .usecase
            .create_meeting(Some("Standup".to_string()), None, Some("   ".to_string()), None)
            .await;

        // then (期待する結果):
        assert_eq!(no_title, Err(MeetingError::MissingField));
        assert_eq!(blank_start, Err(MeetingError::MissingField));
    }

    #[tokio::test]
    async fn test_created_meeting_is_retrievable() {
        // テスト項目: 作成したミーティングを ID で取得できる
        // given (前提条件):
        let fixture = create_fixture();
        let created = fixture
            .usecase
            .create_meeting(
                Some("Standup".to_string()),
                Some("Daily sync".to_string()),
                Some("2023-06-01T10:00:00Z".to_string()),
                Some("alice".to_string()),
            )
            .await
            .unwrap();

        // when (操作):
        let fetched = fixture.usecase.get_meeting(&created.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(fetched, created);

        // 存在しない ID は NotFound
        let missing = fixture.usecase.get_meeting("no-such-meeting").await;
        assert_eq!(missing, Err(MeetingError::NotFound));
    }
}
