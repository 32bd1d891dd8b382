//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の受付と sender の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、送信だけを担当します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_client(connection_id, tx).await;
/// pusher.push_to(&connection_id, r#"{"event":"room_joined","data":{"roomName":"room1"}}"#).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: ConnectionId / Value: PusherChannel
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", id);
    }

    async fn unregister_client(&self, id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(id).is_some() {
            tracing::debug!("Connection '{}' unregistered from MessagePusher", id);
        }
    }

    async fn push_to(&self, id: &ConnectionId, content: &str) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        let sender = clients
            .get(id)
            .ok_or_else(|| MessagePushError::ClientNotFound(id.to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection '{}'", id);
        Ok(())
    }

    async fn broadcast(&self, targets: &[ConnectionId], content: &str) -> usize {
        // 送信対象の sender だけを複製し、ロックを早めに解放する
        let senders: Vec<(ConnectionId, PusherChannel)> = {
            let clients = self.clients.lock().await;
            targets
                .iter()
                .filter_map(|id| match clients.get(id) {
                    Some(sender) => Some((*id, sender.clone())),
                    None => {
                        tracing::warn!("Connection '{}' not found during broadcast, skipping", id);
                        None
                    }
                })
                .collect()
        };

        let mut delivered = 0;
        for (id, sender) in senders {
            // ブロードキャストでは一部の送信失敗を許容
            match sender.send(content.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("Failed to push message to connection '{}': {}", id, e),
            }
        }
        delivered
    }
}
