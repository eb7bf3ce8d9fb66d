//! UseCase: 接続受け入れ処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//! - 接続 ID の採番・チャネル登録・`connected` ack・人数ブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - `connected` は接続ごとの最初のイベントという保証がクライアントの
//!   自己 ID 学習の前提になっている
//! - オンライン人数が登録数と一致することを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：1 人目・2 人目の接続と人数の通知
//! - エッジケース：採番された ID が互いに重複しない

use std::sync::Arc;

use idobata_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionIdFactory, HubRepository, MessagePusher, PusherChannel, Timestamp,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// 接続受け入れのユースケース
pub struct ConnectSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Clock（現在時刻の抽象化）
    clock: Arc<dyn Clock>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
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

    /// 接続を受け入れる
    ///
    /// # Arguments
    ///
    /// * `sender` - この接続へのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// サーバー側で採番した接続 ID（Domain Model）
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        // 1. 接続 ID をサーバー側で採番する
        let connection_id = ConnectionIdFactory::generate();

        // 2. MessagePusher に送信チャネルを登録する
        self.message_pusher
            .register_client(connection_id.as_str().to_string(), sender)
            .await;

        // 3. `connected` を送る。レジストリ登録前に push することで、
        //    この接続への最初のイベントであることが保たれる
        //    （登録前の接続は他イベントの宛先スナップショットに含まれない）
        let connected = ServerEvent::Connected {
            id: connection_id.as_str().to_string(),
        };
        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &connected.to_json())
            .await
        {
            tracing::warn!("Failed to push connected ack to '{}': {}", connection_id, e);
        }

        // 4. レジストリに登録し、オンライン人数を全接続へ配信する
        let connected_at = Timestamp::new(self.clock.now_ist_millis());
        let outcome = self
            .repository
            .register_connection(connection_id.clone(), connected_at)
            .await;

        let count = ServerEvent::OnlineUsersCount {
            count: outcome.online_count,
        };
        if let Err(e) = self
            .message_pusher
            .broadcast(outcome.all_connections, &count.to_json())
            .await
        {
            tracing::warn!("Failed to broadcast online count: {}", e);
        }

        tracing::info!("Connection '{}' registered", connection_id);
        connection_id
    }
}
