//! UseCase: タイピングレース
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - TypingRaceUseCase の join() / update_progress() メソッド
//! - 課題文の送付・スコアボード配信・勝者確定の一回性
//!
//! ### なぜこのテストが必要か
//! - 勝者はエポックごとに 1 人だけ。100% 到達のたびに `winner` が
//!   再送されるとクライアントの勝利演出が連打される
//! - スコアボードはレース外の接続にも届く（観戦）ことが仕様
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加 → 進捗更新 → 100% 到達で勝者確定
//! - エッジケース：2 人目の 100% 到達、レース外からの進捗報告
//! - エッジケース：ユーザー名が空（エラー ack）

use std::sync::Arc;

use crate::domain::{ConnectionId, HubRepository, MessagePusher, Progress, Username};
use crate::infrastructure::dto::conversion::players_to_map;
use crate::infrastructure::dto::websocket::ServerEvent;

/// タイピングレースのユースケース
pub struct TypingRaceUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn HubRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl TypingRaceUseCase {
    /// 新しい TypingRaceUseCase を作成
    pub fn new(repository: Arc<dyn HubRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// レースに参加する
    ///
    /// 参加者には課題文を送り、全接続にスコアボードを配信する。
    pub async fn join(&self, connection_id: &ConnectionId, username: String) {
        // 1. 入力を検証する
        let username = match Username::new(username) {
            Ok(name) => name,
            Err(e) => {
                let event = ServerEvent::Error {
                    message: e.to_string(),
                };
                if let Err(e) = self
                    .message_pusher
                    .push_to(connection_id, &event.to_json())
                    .await
                {
                    tracing::warn!("Failed to push error ack to '{}': {}", connection_id, e);
                }
                return;
            }
        };

        // 2. レースに登録する
        let Some(outcome) = self.repository.join_race(connection_id, username).await else {
            tracing::debug!("Race join from unknown connection '{}'", connection_id);
            return;
        };

        // 3. 本人に課題文を送る
        let paragraph = ServerEvent::Paragraph {
            text: outcome.paragraph,
        };
        if let Err(e) = self
            .message_pusher
            .push_to(connection_id, &paragraph.to_json())
            .await
        {
            tracing::warn!("Failed to push paragraph to '{}': {}", connection_id, e);
        }

        // 4. 全接続にスコアボードを配信する（観戦者を含む）
        let scoreboard = ServerEvent::UpdatePlayers {
            players: players_to_map(outcome.players),
        };
        self.broadcast(outcome.all_connections, &scoreboard).await;

        tracing::info!("'{}' joined the typing race", connection_id);
    }

    /// 進捗を報告する
    ///
    /// 100% 到達が同一エポックで最初なら勝者として確定し、
    /// `winner` → `updatePlayers` の順で配信する。
    pub async fn update_progress(
        &self,
        connection_id: &ConnectionId,
        progress: f64,
        wpm: f64,
        accuracy: f64,
    ) {
        // 1. 進捗を 0〜100 に丸めて記録する
        let progress = Progress::new(progress);
        let Some(outcome) = self
            .repository
            .update_race_progress(connection_id, progress, wpm, accuracy)
            .await
        else {
            // レース外の接続からの報告は無視する
            return;
        };

        // 2. 新しく確定した勝者がいれば先に発表する
        if let Some(winner) = outcome.winner {
            tracing::info!("Race winner: '{}'", winner);
            let event = ServerEvent::Winner {
                username: winner.into_string(),
            };
            self.broadcast(outcome.all_connections.clone(), &event).await;
        }

        // 3. スコアボードを全接続に配信する
        let scoreboard = ServerEvent::UpdatePlayers {
            players: players_to_map(outcome.players),
        };
        self.broadcast(outcome.all_connections, &scoreboard).await;
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, event: &ServerEvent) {
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.message_pusher.broadcast(targets, &event.to_json()).await {
            tracing::warn!("Failed to broadcast race update: {}", e);
        }
    }
}
