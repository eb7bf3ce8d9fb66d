//! UseCase: 切断時の一括クリーンアップ
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//! - 切断に伴う全状態（キュー・レース・タイピング中・ルーム所属）の解放と
//!   残った接続への各種通知
//!
//! ### なぜこのテストが必要か
//! - 切断は唯一の一括クリーンアップ経路であり、取りこぼすと幽霊参加者が残る
//! - 通知の順序（レース → タイピング解除 → 退出 → 人数 → 一覧)が
//!   クライアントの表示更新の前提になっている
//!
//! ### どのような状況を想定しているか
//! - 正常系：公開ルーム在室中の切断で残メンバーに退出通知が届く
//! - 正常系：プライベートルーム在室中の切断でメンバーリストが更新される
//! - エッジケース：未登録 ID の切断（何も配信されない）
//! - エッジケース：最後のメンバーの切断でルームが消える

use std::sync::Arc;

use idobata_shared::time::{timestamp_to_iso8601, Clock};

use crate::domain::{
    ConnectionId, HubRepository, MessagePusher, RoomDeparture, RoomKind,
};
use crate::infrastructure::dto::conversion::players_to_map;
use crate::infrastructure::dto::websocket::ServerEvent;
use crate::usecase::{new_event_id, ADMIN_USER};

/// 切断処理のユースケース
pub struct DisconnectSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// Clock（現在時刻の抽象化）
    clock: Arc<dyn Clock>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
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

    /// 接続を切断し、関連する全状態を解放する
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断された接続の ID
    pub async fn execute(&self, connection_id: &ConnectionId) {
        // 1. Repository で一括クリーンアップ（1 回のロックで全状態を外す）
        let outcome = self.repository.disconnect(connection_id).await;

        // 2. 送信チャネルを破棄する（以降この接続への push は届かない）
        self.message_pusher
            .unregister_client(connection_id.as_str())
            .await;

        if !outcome.was_registered {
            tracing::debug!("Disconnect for unknown connection '{}'", connection_id);
            return;
        }

        // 3. レース参加中だった場合、残プレイヤー一覧を配信する
        if let Some(players) = outcome.race_players {
            let event = ServerEvent::UpdatePlayers {
                players: players_to_map(players),
            };
            self.broadcast(outcome.remaining_connections.clone(), &event)
                .await;
        }

        // 4. タイピング中だったスコープごとに解除を通知する
        for entry in outcome.typing_clears {
            let event = ServerEvent::StopTyping {
                user_id: connection_id.as_str().to_string(),
                room: entry.room.map(|r| r.into_string()),
            };
            self.broadcast(entry.targets, &event).await;
        }

        // 5. 在室していたルームごとに退出を通知する（ルーム ID 順）
        for departure in outcome.departures {
            self.notify_departure(connection_id, departure).await;
        }

        // 6. 残った全接続へ人数と一覧を配信する
        let count = ServerEvent::OnlineUsersCount {
            count: outcome.online_count,
        };
        self.broadcast(outcome.remaining_connections.clone(), &count)
            .await;

        let list = ServerEvent::OnlineUsersList {
            users: outcome.online_users.into_iter().map(Into::into).collect(),
        };
        self.broadcast(outcome.remaining_connections, &list).await;

        tracing::info!("Connection '{}' cleaned up", connection_id);
    }

    /// ルーム種別ごとの退出通知を送る
    async fn notify_departure(&self, connection_id: &ConnectionId, departure: RoomDeparture) {
        match departure.kind {
            RoomKind::Public => {
                let event = ServerEvent::Message {
                    user: ADMIN_USER.to_string(),
                    text: format!("{} has left the room.", departure.display_name),
                    time: timestamp_to_iso8601(self.clock.now_ist_millis()),
                    id: new_event_id(),
                };
                self.broadcast(departure.remaining, &event).await;
            }
            RoomKind::Private => {
                let left = ServerEvent::UserLeftPrivate {
                    room_id: departure.room_id.as_str().to_string(),
                    user_id: connection_id.as_str().to_string(),
                    username: departure.display_name.clone(),
                    message: format!("{} left the room", departure.display_name),
                    time: timestamp_to_iso8601(self.clock.now_ist_millis()),
                };
                self.broadcast(departure.remaining.clone(), &left).await;

                let users = ServerEvent::PrivateRoomUsers {
                    room_id: departure.room_id.as_str().to_string(),
                    users: departure
                        .remaining_members
                        .into_iter()
                        .map(Into::into)
                        .collect(),
                };
                self.broadcast(departure.remaining, &users).await;
            }
            RoomKind::Meeting => {
                let event = ServerEvent::PeerLeft {
                    id: connection_id.as_str().to_string(),
                };
                self.broadcast(departure.remaining, &event).await;
            }
        }
    }

    /// 失敗を警告ログに落とすだけのブロードキャスト
    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!("Failed to broadcast disconnect notice: {}", e);
        }
    }
}
