//! UseCase: パスコード付きプライベートルーム
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PrivateRoomUseCase の create() / join() / leave() メソッド
//! - 作成・参加の ack と、メンバー全員へのリスト更新通知
//!
//! ### なぜこのテストが必要か
//! - パスコード照合は唯一の入室制御であり、誤判定は情報漏えいに直結する
//! - ack（成否）と通知（リスト更新）の宛先を取り違えない保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成 → 正しいパスコードで参加 → 退出
//! - エッジケース：重複 ID での作成、誤パスコード、存在しないルーム
//! - エッジケース：ユーザー名なしの参加（プレースホルダ名の採用）

use std::sync::Arc;

use idobata_shared::time::{timestamp_to_iso8601, Clock};

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, Passcode, RoomId, RoomMemberInfo, Timestamp,
    Username,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// ルーム作成 ack の成功メッセージ
const CREATED_MESSAGE: &str = "Private room created successfully!";

/// プライベートルーム操作のユースケース
pub struct PrivateRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Clock（現在時刻の抽象化）
    clock: Arc<dyn Clock>,
}

impl PrivateRoomUseCase {
    /// 新しい PrivateRoomUseCase を作成
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

    /// プライベートルームを作成する
    ///
    /// 成否にかかわらず作成者に `privateRoomCreated` ack を返す。
    pub async fn create(
        &self,
        connection_id: &ConnectionId,
        room_id: String,
        passcode: String,
        username: String,
    ) {
        // 1. 入力を検証する（失敗は ack の message にそのまま載せる)
        let raw_room_id = room_id.clone();
        let parsed = RoomId::new(room_id)
            .and_then(|room_id| Ok((room_id, Passcode::new(passcode)?)))
            .and_then(|(room_id, passcode)| Ok((room_id, passcode, Username::new(username)?)));
        let (room_id, passcode, username) = match parsed {
            Ok(values) => values,
            Err(e) => {
                self.ack_create(connection_id, false, &raw_room_id, &e.to_string())
                    .await;
                return;
            }
        };

        // 2. Repository でルームを作成する（作成者は最初のメンバーになる）
        let created_at = Timestamp::new(self.clock.now_ist_millis());
        let result = self
            .repository
            .create_private_room(connection_id, room_id.clone(), passcode, username, created_at)
            .await;

        // 3. 結果を ack する
        match result {
            Ok(()) => {
                tracing::info!("Private room '{}' created by '{}'", room_id, connection_id);
                self.ack_create(connection_id, true, room_id.as_str(), CREATED_MESSAGE)
                    .await;
            }
            Err(e) => {
                self.ack_create(connection_id, false, room_id.as_str(), &e.to_string())
                    .await;
            }
        }
    }

    /// パスコードを照合してプライベートルームに参加する
    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        room_id: String,
        passcode: String,
        username: Option<String>,
    ) {
        // 1. 入力を検証する（ユーザー名は任意。空ならプレースホルダ名になる）
        let parsed =
            RoomId::new(room_id).and_then(|room_id| Ok((room_id, Passcode::new(passcode)?)));
        let (room_id, passcode) = match parsed {
            Ok(values) => values,
            Err(e) => {
                self.ack_join(connection_id, false, Some(e.to_string())).await;
                return;
            }
        };
        let username = username.and_then(|name| Username::new(name).ok());

        // 2. Repository でパスコードを照合して参加する
        let outcome = match self
            .repository
            .join_private_room(connection_id, &room_id, &passcode, username)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.ack_join(connection_id, false, Some(e.to_string())).await;
                return;
            }
        };

        // 3. 本人に成功 ack を返してから、メンバー全員（本人含む）に
        //    参加通知とリスト更新を配信する
        self.ack_join(connection_id, true, None).await;

        let member_ids: Vec<ConnectionId> =
            outcome.members.iter().map(|m| m.id.clone()).collect();
        let joined = ServerEvent::UserJoinedPrivate {
            room_id: room_id.as_str().to_string(),
            user_id: connection_id.as_str().to_string(),
            username: outcome.joiner_name.clone(),
            message: format!("{} joined the room", outcome.joiner_name),
            time: timestamp_to_iso8601(self.clock.now_ist_millis()),
        };
        self.broadcast(member_ids.clone(), &joined).await;
        self.broadcast_member_list(member_ids, &room_id, outcome.members)
            .await;

        tracing::info!("'{}' joined private room '{}'", connection_id, room_id);
    }

    /// プライベートルームから退出する
    ///
    /// 不正な入力や非メンバーからの退出は黙って無視する。
    pub async fn leave(&self, connection_id: &ConnectionId, room_id: String) {
        // 1. 入力を検証する（退出に ack はない）
        let Ok(room_id) = RoomId::new(room_id) else {
            return;
        };

        // 2. Repository で退出の状態遷移を行う
        let Some(outcome) = self
            .repository
            .leave_private_room(connection_id, &room_id)
            .await
        else {
            return;
        };

        // 3. 残メンバーに退出通知とリスト更新を配信する
        let remaining_ids: Vec<ConnectionId> =
            outcome.remaining.iter().map(|m| m.id.clone()).collect();
        let left = ServerEvent::UserLeftPrivate {
            room_id: room_id.as_str().to_string(),
            user_id: connection_id.as_str().to_string(),
            username: outcome.username.clone(),
            message: format!("{} left the room", outcome.username),
            time: timestamp_to_iso8601(self.clock.now_ist_millis()),
        };
        self.broadcast(remaining_ids.clone(), &left).await;
        self.broadcast_member_list(remaining_ids, &room_id, outcome.remaining)
            .await;

        if outcome.room_deleted {
            tracing::info!("Private room '{}' deleted (no members left)", room_id);
        }
    }

    async fn ack_create(
        &self,
        connection_id: &ConnectionId,
        success: bool,
        room_id: &str,
        message: &str,
    ) {
        let event = ServerEvent::PrivateRoomCreated {
            success,
            room_id: room_id.to_string(),
            message: message.to_string(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &event.to_json())
            .await
        {
            tracing::warn!("Failed to push create ack to '{}': {}", connection_id, e);
        }
    }

    async fn ack_join(
        &self,
        connection_id: &ConnectionId,
        success: bool,
        message: Option<String>,
    ) {
        let event = ServerEvent::JoinPrivateRoomResult { success, message };
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &event.to_json())
            .await
        {
            tracing::warn!("Failed to push join ack to '{}': {}", connection_id, e);
        }
    }

    async fn broadcast_member_list(
        &self,
        targets: Vec<ConnectionId>,
        room_id: &RoomId,
        members: Vec<RoomMemberInfo>,
    ) {
        let event = ServerEvent::PrivateRoomUsers {
            room_id: room_id.as_str().to_string(),
            users: members.into_iter().map(Into::into).collect(),
        };
        self.broadcast(targets, &event).await;
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!("Failed to broadcast private room notice: {}", e);
        }
    }
}
