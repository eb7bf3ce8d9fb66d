//! UseCase: 公開ルームへの参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - ユーザー名の申告・ウェルカム通知・参加/退出通知・オンライン一覧の更新
//!
//! ### なぜこのテストが必要か
//! - 参加通知は「新規参加のときだけ」送る仕様で、再 join での重複通知は
//!   クライアント表示を壊す
//! - 公開ルームは同時に 1 つだけという不変条件（自動退出）の確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：初回参加で本人にウェルカム、他メンバーに参加通知
//! - 正常系：別ルームへの移動で旧ルームに退出通知
//! - エッジケース：同じルームへの再 join（参加通知なし、ウェルカムは再送）
//! - エッジケース：ユーザー名が空（エラー ack）
//! - エッジケース：同名のプライベートルームが既にある（エラー ack）

use std::sync::Arc;

use idobata_shared::time::{timestamp_to_iso8601, Clock};

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, RoomError, RoomId, Timestamp, Username,
};
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::usecase::{new_event_id, ADMIN_USER};

/// 公開ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Clock（現在時刻の抽象化）
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
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

    /// ユーザー名を申告して公開ルームに参加する
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加する接続の ID
    /// * `username` - 申告されたユーザー名（未検証）
    /// * `room` - 参加先のルーム ID（未検証）
    pub async fn execute(&self, connection_id: &ConnectionId, username: String, room: String) {
        // 1. 入力を検証する（失敗はエラー ack で本人にだけ返す）
        let username = match Username::new(username) {
            Ok(name) => name,
            Err(e) => {
                self.push_error(connection_id, &e.to_string()).await;
                return;
            }
        };
        let room_id = match RoomId::new(room) {
            Ok(id) => id,
            Err(e) => {
                self.push_error(connection_id, &e.to_string()).await;
                return;
            }
        };

        // 2. Repository でルーム参加の状態遷移を行う
        let joined_at = Timestamp::new(self.clock.now_ist_millis());
        let Some(outcome) = self
            .repository
            .join_public_room(connection_id, room_id.clone(), username.clone(), joined_at)
            .await
        else {
            // 未登録の接続からの join は黙って無視する
            tracing::debug!("Join from unknown connection '{}'", connection_id);
            return;
        };

        // 3. 同名の別種ルームと衝突した場合、参加は不成立。
        //    ユーザー名の申告だけが有効になるため一覧は更新する
        if !outcome.joined_room {
            self.push_error(connection_id, &RoomError::RoomAlreadyExists.to_string())
                .await;
            self.broadcast_online_list(outcome.all_connections, outcome.online_users)
                .await;
            return;
        }

        // 4. 別の公開ルームから移ってきた場合、旧ルームに退出通知を送る
        if let Some(previous) = outcome.previous_room {
            let left = self.admin_notice(format!("{} has left the room.", username.as_str()));
            self.broadcast(previous.remaining, &left).await;
        }

        // 5. 本人にウェルカムを送る（再 join でも毎回送る）
        let welcome =
            self.admin_notice(format!("Welcome to the room, {}!", username.as_str()));
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &welcome.to_json())
            .await
        {
            tracing::warn!("Failed to push welcome to '{}': {}", connection_id, e);
        }

        // 6. 新規参加のときだけ、他メンバーへ参加通知を送る
        if outcome.newly_joined {
            let joined = self.admin_notice(format!("{} has joined the room.", username.as_str()));
            self.broadcast(outcome.other_members, &joined).await;
        }

        // 7. 全接続へオンライン一覧を配信する
        self.broadcast_online_list(outcome.all_connections, outcome.online_users)
            .await;

        tracing::info!(
            "'{}' joined room '{}' as '{}'",
            connection_id,
            room_id,
            username
        );
    }

    /// Admin 名義の通知メッセージを組み立てる
    fn admin_notice(&self, text: String) -> ServerEvent {
        ServerEvent::Message {
            user: ADMIN_USER.to_string(),
            text,
            time: timestamp_to_iso8601(self.clock.now_ist_millis()),
            id: new_event_id(),
        }
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

    async fn broadcast_online_list(
        &self,
        targets: Vec<ConnectionId>,
        users: Vec<crate::domain::OnlineUser>,
    ) {
        let event = ServerEvent::OnlineUsersList {
            users: users.into_iter().map(Into::into).collect(),
        };
        self.broadcast(targets, &event).await;
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!("Failed to broadcast join notice: {}", e);
        }
    }
}
