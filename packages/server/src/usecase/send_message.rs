//! UseCase: チャットメッセージとファイル通知の中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase の各中継メソッド
//! - 公開ルーム・プライベートルーム・ミーティングそれぞれの宛先解決と
//!   タイムスタンプ形式（壁時計 "HH:MM:SS" / ISO 8601）
//!
//! ### なぜこのテストが必要か
//! - 宛先解決を誤ると別ルームへのメッセージ漏えいになる
//! - 送信者自身も宛先に含まれる（エコーバック）ことをクライアントが
//!   前提にしている
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルーム全員への配信（送信者を含む）
//! - エッジケース：ルーム未参加での送信（公開は無視、プライベートは ack）
//! - エッジケース：ファイル通知の公開/プライベート振り分けと拒否 ack

use std::sync::Arc;

use idobata_shared::time::{timestamp_to_iso8601, timestamp_to_ist_hms, Clock};
use serde_json::Value;

use crate::domain::{
    ConnectionId, FileNoticeError, HubRepository, MessagePusher, RoomError, RoomId,
};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::usecase::new_event_id;

/// メッセージ中継のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Clock（現在時刻の抽象化）
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn HubRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    /// 公開ルームにメッセージを送る
    ///
    /// ユーザー名未設定・ルーム未参加の送信は黙って捨てる（ack なし）。
    pub async fn send_public(&self, connection_id: &ConnectionId, text: String) {
        // 1. 送信者の現在ルームと宛先を解決する
        let Some(outcome) = self.repository.public_message_targets(connection_id).await else {
            tracing::debug!("Public message from '{}' with no room", connection_id);
            return;
        };

        // 2. 送信者を含むルーム全員へ配信する
        let event = ServerEvent::Message {
            user: outcome.username.into_string(),
            text,
            time: timestamp_to_ist_hms(self.clock.now_ist_millis()),
            id: new_event_id(),
        };
        self.broadcast(outcome.targets, &event).await;

        tracing::debug!(
            "Public message from '{}' relayed to room '{}'",
            connection_id,
            outcome.room_id
        );
    }

    /// プライベートルームにメッセージを送る
    ///
    /// 非メンバーや存在しないルームへの送信はエラー ack になる。
    pub async fn send_private(
        &self,
        connection_id: &ConnectionId,
        room_id: String,
        message: String,
    ) {
        // 1. 入力を検証する
        let Ok(room_id) = RoomId::new(room_id) else {
            self.push_error(connection_id, &RoomError::NotAMember.to_string())
                .await;
            return;
        };

        // 2. メンバーシップを確認して宛先を解決する
        let outcome = match self
            .repository
            .private_message_targets(connection_id, &room_id)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.push_error(connection_id, &e.to_string()).await;
                return;
            }
        };

        // 3. 送信者を含むメンバー全員へ配信する
        let event = ServerEvent::PrivateMessage {
            room_id: room_id.into_string(),
            user_id: connection_id.as_str().to_string(),
            username: outcome.sender_name,
            message,
            time: timestamp_to_ist_hms(self.clock.now_ist_millis()),
            id: new_event_id(),
        };
        self.broadcast(outcome.targets, &event).await;
    }

    /// ミーティング内チャットを中継する
    ///
    /// `user` は join-meeting で申告されたものと同じ不透明なプロフィール。
    pub async fn send_meeting_chat(
        &self,
        connection_id: &ConnectionId,
        meeting_id: String,
        message: String,
        user: Option<Value>,
    ) {
        // 1. 入力を検証する（不正な ID は無視）
        let Ok(room_id) = RoomId::new(meeting_id) else {
            return;
        };

        // 2. ミーティングの参加者全員へ配信する
        let targets = self.repository.meeting_targets(&room_id).await;
        if targets.is_empty() {
            tracing::debug!("Meeting chat to empty meeting '{}'", room_id);
            return;
        }
        let event = ServerEvent::ChatMessage {
            message,
            user,
            time: timestamp_to_iso8601(self.clock.now_ist_millis()),
            id: new_event_id(),
        };
        self.broadcast(targets, &event).await;

        tracing::debug!("Meeting chat from '{}' in '{}'", connection_id, room_id);
    }

    /// ファイルアップロード通知をルームに中継する
    ///
    /// ファイル本体は外部のアップロードサービスが持つ。ここで中継するのは
    /// メタデータ（`file_info`）だけ。
    pub async fn relay_file_notice(
        &self,
        connection_id: &ConnectionId,
        room_id: String,
        file_info: Value,
        is_private: bool,
    ) {
        // 1. 入力を検証する（不正な ID は対象ルーム不在として ack）
        let Ok(room_id) = RoomId::new(room_id) else {
            let error = if is_private {
                FileNoticeError::NotInPrivateRoom
            } else {
                FileNoticeError::NotInRoom
            };
            self.push_file_error(connection_id, &error.to_string()).await;
            return;
        };

        // 2. 送信者の身元とメンバーシップを確認する
        let outcome = match self
            .repository
            .file_notice_targets(connection_id, &room_id, is_private)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.push_file_error(connection_id, &e.to_string()).await;
                return;
            }
        };

        // 3. ルーム全員（送信者を含む）へ通知する
        let time = timestamp_to_ist_hms(self.clock.now_ist_millis());
        let event = if is_private {
            ServerEvent::PrivateFileUploaded {
                room_id: room_id.into_string(),
                user_id: connection_id.as_str().to_string(),
                username: outcome.username.into_string(),
                file: file_info,
                time,
                id: new_event_id(),
            }
        } else {
            ServerEvent::FileUploaded {
                user_id: connection_id.as_str().to_string(),
                username: outcome.username.into_string(),
                file: file_info,
                time,
                id: new_event_id(),
            }
        };
        self.broadcast(outcome.targets, &event).await;
    }

    /// 録画 URL の公開をミーティング参加者に通知する
    pub async fn relay_recording(&self, meeting_id: String, url: String) {
        let Ok(room_id) = RoomId::new(meeting_id) else {
            return;
        };
        let targets = self.repository.meeting_targets(&room_id).await;
        let event = ServerEvent::RecordingAvailable { url };
        self.broadcast(targets, &event).await;
    }

    async fn push_error(&self, connection_id: &ConnectionId, message: &str) {
        let event = ServerEvent::Error {
            message: message.to_string(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &event.to_json())
            .await
        {
            tracing::warn!("Failed to push error ack to '{}': {}", connection_id, e);
        }
    }

    async fn push_file_error(&self, connection_id: &ConnectionId, message: &str) {
        let event = ServerEvent::FileUploadError {
            message: message.to_string(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &event.to_json())
            .await
        {
            tracing::warn!("Failed to push file error ack to '{}': {}", connection_id, e);
        }
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!("Failed to broadcast message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Passcode, Timestamp, Username};
    use crate::infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryHubRepository,
    };
    use idobata_shared::time::FixedClock;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: SendMessageUseCase,
        repository: Arc<InMemoryHubRepository>,
        pusher: Arc<WebSocketMessagePusher>,
    }

    fn create_fixture() -> Fixture {
        let repository = Arc::new(InMemoryHubRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = SendMessageUseCase::new(
            repository.clone(),
            pusher.clone(),
            // 2023-01-01 00:00:00 IST
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

    async fn join_public(fixture: &Fixture, id: &ConnectionId, name: &str, room: &str) {
        fixture
            .repository
            .join_public_room(
                id,
                RoomId::new(room.to_string()).unwrap(),
                Username::new(name.to_string()).unwrap(),
                Timestamp::new(0),
            )
            .await;
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
    async fn test_public_message_reaches_room_including_sender() {
        // テスト項目: 公開メッセージが送信者を含むルーム全員に届く
        // given (前提条件): alice と bob が general にいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (bob, mut bob_rx) = register(&fixture, "conn-bob").await;
        join_public(&fixture, &alice, "alice", "general").await;
        join_public(&fixture, &bob, "bob", "general").await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        fixture
            .usecase
            .send_public(&alice, "hello there".to_string())
            .await;

        // then (期待する結果): 壁時計形式のタイムスタンプ付きで両方に届く
        for rx in [&mut alice_rx, &mut bob_rx] {
            let events = collect(rx);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0]["type"], "message");
            assert_eq!(events[0]["user"], "alice");
            assert_eq!(events[0]["text"], "hello there");
            assert_eq!(events[0]["time"], "00:00:00");
            assert!(events[0]["id"].is_string());
        }
    }

    #[tokio::test]
    async fn test_public_message_does_not_leak_across_rooms() {
        // テスト項目: 公開メッセージが別ルームに漏れない
        // given (前提条件): alice は general、carol は games にいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (carol, mut carol_rx) = register(&fixture, "conn-carol").await;
        join_public(&fixture, &alice, "alice", "general").await;
        join_public(&fixture, &carol, "carol", "games").await;
        drain(&mut alice_rx);
        drain(&mut carol_rx);

        // when (操作):
        fixture.usecase.send_public(&alice, "hi".to_string()).await;

        // then (期待する結果):
        assert_eq!(collect(&mut alice_rx).len(), 1);
        assert!(carol_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_public_message_without_room_is_dropped() {
        // テスト項目: ルーム未参加の公開メッセージは黙って捨てられる
        // given (前提条件): alice はどのルームにもいない
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;

        // when (操作):
        fixture.usecase.send_public(&alice, "void".to_string()).await;

        // then (期待する結果): ack も配信もない
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_private_message_reaches_members() {
        // テスト項目: プライベートメッセージがメンバー全員に届く
        // given (前提条件): alice のルームに bob が参加している
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (bob, mut bob_rx) = register(&fixture, "conn-bob").await;
        let room_id = RoomId::new("secret".to_string()).unwrap();
        fixture
            .repository
            .create_private_room(
                &alice,
                room_id.clone(),
                Passcode::new("1234".to_string()).unwrap(),
                Username::new("alice".to_string()).unwrap(),
                Timestamp::new(0),
            )
            .await
            .unwrap();
        fixture
            .repository
            .join_private_room(
                &bob,
                &room_id,
                &Passcode::new("1234".to_string()).unwrap(),
                Some(Username::new("bob".to_string()).unwrap()),
            )
            .await
            .unwrap();
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        fixture
            .usecase
            .send_private(&bob, "secret".to_string(), "psst".to_string())
            .await;

        // then (期待する結果):
        let to_alice = collect(&mut alice_rx);
        assert_eq!(to_alice[0]["type"], "privateMessage");
        assert_eq!(to_alice[0]["roomId"], "secret");
        assert_eq!(to_alice[0]["userId"], "conn-bob");
        assert_eq!(to_alice[0]["username"], "bob");
        assert_eq!(to_alice[0]["message"], "psst");
        assert_eq!(to_alice[0]["time"], "00:00:00");
        assert_eq!(collect(&mut bob_rx).len(), 1);
    }

    #[tokio::test]
    async fn test_private_message_from_non_member_is_rejected() {
        // テスト項目: 非メンバーのプライベートメッセージがエラー ack になる
        // given (前提条件): alice のルームがあり、bob は非メンバー
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (bob, mut bob_rx) = register(&fixture, "conn-bob").await;
        fixture
            .repository
            .create_private_room(
                &alice,
                RoomId::new("secret".to_string()).unwrap(),
                Passcode::new("1234".to_string()).unwrap(),
                Username::new("alice".to_string()).unwrap(),
                Timestamp::new(0),
            )
            .await
            .unwrap();
        drain(&mut alice_rx);

        // when (操作):
        fixture
            .usecase
            .send_private(&bob, "secret".to_string(), "let me in".to_string())
            .await;

        // then (期待する結果): bob にだけエラー ack が届く
        let to_bob = collect(&mut bob_rx);
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0]["type"], "error");
        assert_eq!(to_bob[0]["message"], "You are not in this room");
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_meeting_chat_uses_iso_timestamp() {
        // テスト項目: ミーティングチャットが ISO 8601 時刻で届く
        // given (前提条件): alice と bob が同じミーティングにいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        let (bob, mut bob_rx) = register(&fixture, "conn-bob").await;
        let meeting = RoomId::new("standup".to_string()).unwrap();
        fixture
            .repository
            .join_meeting_room(&alice, meeting.clone(), None, Timestamp::new(0))
            .await;
        fixture
            .repository
            .join_meeting_room(
                &bob,
                meeting.clone(),
                Some(serde_json::json!({"name": "bob"})),
                Timestamp::new(0),
            )
            .await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        fixture
            .usecase
            .send_meeting_chat(
                &bob,
                "standup".to_string(),
                "morning".to_string(),
                Some(serde_json::json!({"name": "bob"})),
            )
            .await;

        // then (期待する結果):
        let to_alice = collect(&mut alice_rx);
        assert_eq!(to_alice[0]["type"], "chat-message");
        assert_eq!(to_alice[0]["message"], "morning");
        assert_eq!(to_alice[0]["user"]["name"], "bob");
        assert_eq!(to_alice[0]["time"], "2022-12-31T18:30:00.000Z");
        assert_eq!(collect(&mut bob_rx).len(), 1);
    }

    #[tokio::test]
    async fn test_file_notice_routed_by_privacy_flag() {
        // テスト項目: 公開のファイル通知が file_uploaded として届く
        // given (前提条件): alice が general にいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        join_public(&fixture, &alice, "alice", "general").await;
        drain(&mut alice_rx);

        // when (操作):
        fixture
            .usecase
            .relay_file_notice(
                &alice,
                "general".to_string(),
                serde_json::json!({"url": "/files/report.pdf", "name": "report.pdf"}),
                false,
            )
            .await;

        // then (期待する結果):
        let events = collect(&mut alice_rx);
        assert_eq!(events[0]["type"], "file_uploaded");
        assert_eq!(events[0]["username"], "alice");
        assert_eq!(events[0]["file"]["name"], "report.pdf");
        assert_eq!(events[0]["time"], "00:00:00");
    }

    #[tokio::test]
    async fn test_file_notice_without_username_is_rejected() {
        // テスト項目: ユーザー名未設定のファイル通知が拒否される
        // given (前提条件): alice は接続済みだが join していない
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;

        // when (操作):
        fixture
            .usecase
            .relay_file_notice(
                &alice,
                "general".to_string(),
                serde_json::json!({"url": "/files/x"}),
                false,
            )
            .await;

        // then (期待する結果):
        let events = collect(&mut alice_rx);
        assert_eq!(events[0]["type"], "file_upload_error");
        assert_eq!(events[0]["message"], "User not found");
    }

    #[tokio::test]
    async fn test_recording_notice_reaches_meeting() {
        // テスト項目: 録画通知がミーティング参加者に届く
        // given (前提条件): alice がミーティングにいる
        let fixture = create_fixture();
        let (alice, mut alice_rx) = register(&fixture, "conn-alice").await;
        fixture
            .repository
            .join_meeting_room(
                &alice,
                RoomId::new("standup".to_string()).unwrap(),
                None,
                Timestamp::new(0),
            )
            .await;
        drain(&mut alice_rx);

        // when (操作):
        fixture
            .usecase
            .relay_recording("standup".to_string(), "https://rec.example/1".to_string())
            .await;

        // then (期待する結果):
        let events = collect(&mut alice_rx);
        assert_eq!(events[0]["type"], "recording-available");
        assert_eq!(events[0]["url"], "https://rec.example/1");
    }
}
