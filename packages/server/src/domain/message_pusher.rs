//! MessagePusher trait 定義
//!
//! 接続中のクライアントへ送信済み JSON を届けるためのインターフェース。
//! WebSocket など具体的な送信手段は Infrastructure 層が実装します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// クライアントごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel);

    /// クライアントの送信チャンネルを登録解除（冪等）
    async fn unregister_client(&self, id: &ConnectionId);

    /// 特定のクライアントに送信
    async fn push_to(&self, id: &ConnectionId, content: &str) -> Result<(), MessagePushError>;

    /// 複数のクライアントに送信し、実際に届けた件数を返す
    ///
    /// 一部のクライアントへの送信失敗は他のクライアントへの送信に影響しない。
    async fn broadcast(&self, targets: &[ConnectionId], content: &str) -> usize;
}
