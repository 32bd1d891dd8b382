//! UseCase: Connection Registry
//!
//! 接続のライフサイクル（登録・表示名設定・登録解除）を管理する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - register / set_identity / unregister
//!
//! ### なぜこのテストが必要か
//! - 登録解除後にどのルームにも接続が残らないことを保証
//! - 表示名は一度しか設定できないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続 → 表示名設定 → 参加 → 切断
//! - 異常系：空の表示名、二度目の表示名設定
//! - エッジケース：二重の登録解除（冪等）

use std::sync::Arc;

use belltower_shared::time::now_millis;

use crate::domain::{
    Connection, ConnectionId, DisplayName, MessagePusher, PusherChannel, RelayRepository,
    RepositoryError, Timestamp,
};

use super::{broadcaster::RoomBroadcaster, error::RegistryError};

/// Connection Registry
pub struct ConnectionRegistry {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RelayRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 切断時のルーム離脱に使う
    broadcaster: Arc<RoomBroadcaster>,
}

impl ConnectionRegistry {
    /// 新しい ConnectionRegistry を作成
    pub fn new(
        repository: Arc<dyn RelayRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        broadcaster: Arc<RoomBroadcaster>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            broadcaster,
        }
    }

    /// 新しい接続を登録する
    ///
    /// # Arguments
    ///
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(ConnectionId)` - 採番された接続 ID
    /// * `Err(RegistryError)` - 登録失敗
    pub async fn register(&self, sender: PusherChannel) -> Result<ConnectionId, RegistryError> {
        let id = ConnectionId::generate();
        let connection = Connection::new(id, Timestamp::new(now_millis()));

        self.repository
            .insert_connection(connection)
            .await
            .map_err(|e| RegistryError::InvalidState(e.to_string()))?;
        self.message_pusher.register_client(id, sender).await;

        tracing::info!(
            "Connection {} registered (total: {})",
            id,
            self.repository.count_connections().await
        );
        Ok(id)
    }

    /// 接続の表示名を設定する（一度のみ）
    pub async fn set_identity(
        &self,
        id: &ConnectionId,
        name: &str,
    ) -> Result<DisplayName, RegistryError> {
        let display_name =
            DisplayName::new(name).map_err(|e| RegistryError::InvalidState(e.to_string()))?;

        self.repository
            .set_display_name(id, display_name.clone())
            .await
            .map_err(|e| match e {
                RepositoryError::ConnectionNotFound(id) => RegistryError::NotFound(id),
                other => RegistryError::InvalidState(other.to_string()),
            })?;

        tracing::debug!("Connection {} identified as '{}'", id, display_name);
        Ok(display_name)
    }

    /// 接続を登録解除する
    ///
    /// ルームから外し、接続レコードと送信チャンネルを破棄する。
    /// 既に解除済みの場合は `None`（何もしない）。
    pub async fn unregister(&self, id: &ConnectionId) -> Option<Connection> {
        self.broadcaster.leave(id).await;
        let removed = self.repository.remove_connection(id).await;
        self.message_pusher.unregister_client(id).await;

        if let Some(connection) = &removed {
            tracing::info!(
                "Connection {} ({}) unregistered (total: {})",
                id,
                connection
                    .display_name
                    .as_ref()
                    .map(DisplayName::as_str)
                    .unwrap_or("anonymous"),
                self.repository.count_connections().await
            );
        }
        removed
    }

    /// 接続を取得
    pub async fn connection(&self, id: &ConnectionId) -> Option<Connection> {
        self.repository.get_connection(id).await
    }

    /// 現在の接続数
    pub async fn count(&self) -> usize {
        self.repository.count_connections().await
    }
}
