//! MessagePusher trait 定義
//!
//! UseCase 層がクライアントへメッセージを届けるためのインターフェース。
//! 具体的な実装（WebSocket など）は Infrastructure 層が提供します。

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// クライアントへの送信チャネル
///
/// UI 層が WebSocket 接続ごとに生成し、MessagePusher に登録する。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// メッセージ送信インターフェース
///
/// UseCase 層はこの trait に依存し、WebSocket などの具体的な
/// 送信手段には依存しない。
///
/// ## 送信失敗の扱い
///
/// - `push_to`: 宛先が見つからなければエラーを返す
/// - `broadcast`: 一部の宛先が消えていても警告ログだけ残して続行する
///   （切断直後のクライアントが宛先に含まれることは正常系）
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャネルを登録
    async fn register_client(&self, connection_id: String, sender: PusherChannel);

    /// クライアントの送信チャネルを削除
    async fn unregister_client(&self, connection_id: &str);

    /// 特定のクライアントにメッセージを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントにメッセージを送信
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
