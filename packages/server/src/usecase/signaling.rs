//! UseCase: WebRTC シグナリングの 1 対 1 中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SignalingUseCase の各中継メソッド（ミーティング系 / 1:1 通話系）
//! - ペイロードを解釈せずそのまま転送すること、宛先消失時の黙殺
//!
//! ### なぜこのテストが必要か
//! - SDP や ICE candidate の中身はクライアント間の取り決めで、サーバーが
//!   変形すると接続確立が壊れる
//! - 宛先が切断直後でも送信者へエラーを返さない（リトライは ICE の仕事）
//!
//! ### どのような状況を想定しているか
//! - 正常系：offer / answer / candidate の転送と from の付与
//! - 正常系：ミーティング系 offer への送信者プロフィールの添付
//! - エッジケース：candidate なしの ice-candidate、存在しない宛先

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{ConnectionId, HubRepository, MessagePusher};
use crate::infrastructure::dto::websocket::ServerEvent;

/// シグナリング中継のユースケース
pub struct SignalingUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SignalingUseCase {
    /// 新しい SignalingUseCase を作成
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// ミーティング内の SDP offer を転送する
    ///
    /// 送信者が join-meeting で申告したプロフィールを `user` として添える。
    pub async fn relay_meeting_offer(&self, from: &ConnectionId, to: String, sdp: Value) {
        let user = self.repository.meeting_user(from).await;
        let event = ServerEvent::WebrtcOffer {
            from: from.as_str().to_string(),
            sdp,
            user,
        };
        self.relay(from, to, &event).await;
    }

    /// ミーティング内の SDP answer を転送する
    pub async fn relay_meeting_answer(&self, from: &ConnectionId, to: String, sdp: Value) {
        let event = ServerEvent::WebrtcAnswer {
            from: from.as_str().to_string(),
            sdp,
        };
        self.relay(from, to, &event).await;
    }

    /// ミーティング内の ICE candidate を転送する
    pub async fn relay_meeting_ice(&self, from: &ConnectionId, to: String, candidate: Value) {
        let event = ServerEvent::WebrtcIce {
            from: from.as_str().to_string(),
            candidate,
        };
        self.relay(from, to, &event).await;
    }

    /// 1:1 通話の offer を転送する
    pub async fn relay_call_offer(&self, from: &ConnectionId, to: String, offer: Value) {
        let event = ServerEvent::CallOffer {
            from: from.as_str().to_string(),
            offer,
        };
        self.relay(from, to, &event).await;
    }

    /// 1:1 通話の answer を転送する
    pub async fn relay_call_answer(&self, from: &ConnectionId, to: String, answer: Value) {
        let event = ServerEvent::CallAnswer {
            from: from.as_str().to_string(),
            answer,
        };
        self.relay(from, to, &event).await;
    }

    /// 1:1 通話の ICE candidate を転送する
    ///
    /// candidate が無いイベントは収集終了の合図なので転送しない。
    pub async fn relay_call_ice(&self, from: &ConnectionId, to: String, candidate: Option<Value>) {
        let Some(candidate) = candidate else {
            return;
        };
        let event = ServerEvent::IceCandidate {
            from: from.as_str().to_string(),
            candidate,
        };
        self.relay(from, to, &event).await;
    }

    /// 通話終了を相手に通知する
    pub async fn end_call(&self, from: &ConnectionId, to: String) {
        let event = ServerEvent::CallEnded {
            from: from.as_str().to_string(),
        };
        self.relay(from, to, &event).await;
    }

    /// 単一宛先への転送
    ///
    /// 宛先がいない場合もエラーを返さない。切断との競合で宛先が消えるのは
    /// 正常系で、送信側は ICE の再試行やタイムアウトで回復する。
    async fn relay(&self, from: &ConnectionId, to: String, event: &ServerEvent) {
        let Ok(target) = ConnectionId::new(to) else {
            return;
        };
        if let Err(e) = self.message_pusher.push_to(&target, &event.to_json()).await {
            tracing::debug!(
                "Dropped signaling relay from '{}' to '{}': {}",
                from,
                target,
                e
            );
        }
    }
}
