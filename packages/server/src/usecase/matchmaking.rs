//! UseCase: ランダムマッチング
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - MatchmakingUseCase::enqueue() メソッド
//! - FIFO キューでの待機と 2 人揃ったときのペア成立通知
//!
//! ### なぜこのテストが必要か
//! - 自分自身とのペア成立は起きてはならない
//! - ペア成立時、両者に同じルームラベルと互いの ID が届くことが
//!   その後の 1:1 通話開始の前提になる
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人目のリクエストでペアが成立する
//! - エッジケース：1 人だけの待機、同一接続からの重複リクエスト

use std::sync::Arc;

use crate::domain::{ConnectionId, HubRepository, MessagePusher};
use crate::infrastructure::dto::websocket::ServerEvent;

/// ランダムマッチングのユースケース
pub struct MatchmakingUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl MatchmakingUseCase {
    /// 新しい MatchmakingUseCase を作成
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// マッチングキューに並ぶ
    ///
    /// 2 人揃うまでは何も送らない。成立したら両者それぞれに相手の ID と
    /// 共通のルームラベルを届ける。
    pub async fn enqueue(&self, connection_id: &ConnectionId) {
        // 1. キューに並ばせる（2 人揃えばペアが返る）
        let Some(pair) = self.repository.enqueue_for_match(connection_id).await else {
            tracing::debug!("'{}' is waiting for a match", connection_id);
            return;
        };

        // 2. 両者に成立を通知する
        let room_id = pair.room_label();
        tracing::info!(
            "Matched '{}' with '{}' in '{}'",
            pair.first,
            pair.second,
            room_id
        );
        self.notify(&pair.first, &room_id, &pair.second).await;
        self.notify(&pair.second, &room_id, &pair.first).await;
    }

    async fn notify(&self, target: &ConnectionId, room_id: &str, other: &ConnectionId) {
        let event = ServerEvent::RandomMatchFound {
            room_id: room_id.to_string(),
            other_id: other.as_str().to_string(),
        };
        if let Err(e) = self.message_pusher.push_to(target, &event.to_json()).await {
            tracing::debug!("Dropped match notice to '{}': {}", target, e);
        }
    }
}
