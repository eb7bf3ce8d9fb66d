//! UseCase: プレゼンス（タイピング中・オンライン一覧・統計）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PresenceUseCase の set_typing() / clear_typing() / sweep_stale() /
//!   send_online_list() メソッド
//! - スコープ（全体 / ルーム）ごとの通知先と、放置されたインジケータの失効
//!
//! ### なぜこのテストが必要か
//! - タイピング通知が送信者自身に返ると、クライアントの表示が自分の
//!   入力でちらつく
//! - 切断やクラッシュで `stopTyping` が送られないままのインジケータは
//!   サーバー側の失効だけが解除手段
//!
//! ### どのような状況を想定しているか
//! - 正常系：全体スコープ・ルームスコープそれぞれの開始と解除
//! - エッジケース：ユーザー名未設定のタイピング（プレースホルダ名）
//! - エッジケース：TTL を跨いだ掃除と、直前に更新されたエントリの生存

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{
    ConnectionId, HubRepository, HubStats, MessagePusher, RoomId, RoomSummary, Timestamp,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// タイピング中表示の有効期限（ミリ秒）
///
/// クライアントは入力のたびに `typing` を送り直す。この間隔より長く
/// 更新が途絶えたインジケータは掃除タスクが失効させる。
pub const TYPING_TTL_MILLIS: i64 = 5_000;

/// プレゼンス関連のユースケース
pub struct PresenceUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Clock（現在時刻の抽象化）
    clock: Arc<dyn Clock>,
}

impl PresenceUseCase {
    /// 新しい PresenceUseCase を作成
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

    /// タイピング中を記録して通知する
    ///
    /// `room` があればそのルームのメンバーだけに、なければ全体に届く。
    /// どちらも送信者自身は宛先に含まれない。
    pub async fn set_typing(&self, connection_id: &ConnectionId, room: Option<String>) {
        // 1. 入力を検証する（不正なルーム ID は無視）
        let Ok(room_id) = room.map(RoomId::new).transpose() else {
            return;
        };

        // 2. Repository に記録し、通知先を得る
        let now = Timestamp::new(self.clock.now_ist_millis());
        let Some(outcome) = self
            .repository
            .set_typing(connection_id, room_id.clone(), now)
            .await
        else {
            return;
        };

        // 3. ユーザー名未設定ならプレースホルダ名で通知する
        let username = outcome
            .username
            .map(crate::domain::Username::into_string)
            .unwrap_or_else(|| connection_id.placeholder_name());
        let event = ServerEvent::Typing {
            user_id: connection_id.as_str().to_string(),
            username,
            room: room_id.map(RoomId::into_string),
        };
        self.broadcast(outcome.targets, &event).await;
    }

    /// タイピング中を解除して通知する
    pub async fn clear_typing(&self, connection_id: &ConnectionId, room: Option<String>) {
        let Ok(room_id) = room.map(RoomId::new).transpose() else {
            return;
        };
        let Some(outcome) = self
            .repository
            .clear_typing(connection_id, room_id.clone())
            .await
        else {
            return;
        };

        let event = ServerEvent::StopTyping {
            user_id: connection_id.as_str().to_string(),
            room: room_id.map(RoomId::into_string),
        };
        self.broadcast(outcome.targets, &event).await;
    }

    /// 更新が途絶えたタイピング中状態を失効させる
    ///
    /// サーバーの定期タスクから呼ばれる。失効したスコープごとに
    /// `stopTyping` を配信する。
    pub async fn sweep_stale(&self) {
        let now = Timestamp::new(self.clock.now_ist_millis());
        let entries = self
            .repository
            .sweep_stale_typing(now, TYPING_TTL_MILLIS)
            .await;
        for entry in entries {
            tracing::debug!(
                "Typing indicator for '{}' went stale",
                entry.connection_id
            );
            let event = ServerEvent::StopTyping {
                user_id: entry.connection_id.as_str().to_string(),
                room: entry.room.map(RoomId::into_string),
            };
            self.broadcast(entry.targets, &event).await;
        }
    }

    /// オンライン一覧を要求元にだけ送る
    pub async fn send_online_list(&self, connection_id: &ConnectionId) {
        let users = self.repository.online_users().await;
        let event = ServerEvent::OnlineUsersList {
            users: users.into_iter().map(Into::into).collect(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &event.to_json())
            .await
        {
            tracing::warn!("Failed to push online list to '{}': {}", connection_id, e);
        }
    }

    /// アクティブなルームの一覧スナップショット（HTTP API 用）
    pub async fn rooms_summary(&self) -> Vec<RoomSummary> {
        self.repository.rooms_summary().await
    }

    /// ハブ全体の統計スナップショット（HTTP API 用）
    pub async fn hub_stats(&self) -> HubStats {
        self.repository.stats().await
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!("Failed to broadcast typing notice: {}", e);
        }
    }
}
