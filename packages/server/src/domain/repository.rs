//! Repository trait 定義
//!
//! 接続とルームのメンバーシップを保持するデータストアのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! 接続の割り当てとルームのメンバー集合は常に一つのトランザクション単位で
//! 更新されなければならない。実装は両者を同じロックの下で扱うこと。

use async_trait::async_trait;

use super::{
    Connection, ConnectionId, DisplayName, RepositoryError, Room, RoomId, RoomRoster, Timestamp,
};

/// Relay Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RelayRepository: Send + Sync {
    /// 接続を追加
    async fn insert_connection(&self, connection: Connection) -> Result<(), RepositoryError>;

    /// 接続を取得
    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection>;

    /// 表示名を設定（一度のみ）
    async fn set_display_name(
        &self,
        id: &ConnectionId,
        name: DisplayName,
    ) -> Result<(), RepositoryError>;

    /// 接続を削除し、所属していたルームのメンバー集合からも外す
    ///
    /// 既に削除済みの場合は `None`
    async fn remove_connection(&self, id: &ConnectionId) -> Option<Connection>;

    /// 接続数を取得
    async fn count_connections(&self) -> usize;

    /// 接続をルームに割り当てる（ルームが無ければ作成）
    ///
    /// ルームを新規作成した場合は `true`
    async fn assign_room(
        &self,
        id: &ConnectionId,
        room_id: RoomId,
        timestamp: Timestamp,
    ) -> Result<bool, RepositoryError>;

    /// 接続のルーム割り当てを解除し、空になったルームを削除
    ///
    /// 割り当てが無い場合は `None`
    async fn release_room(&self, id: &ConnectionId) -> Option<RoomId>;

    /// ルームの現在のメンバー（スナップショット）を取得
    async fn room_members(&self, room_id: &RoomId) -> Vec<ConnectionId>;

    /// ルームを取得
    async fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    /// 全ルームのメンバー詳細付き一覧を取得（ルーム ID 順）
    async fn list_rosters(&self) -> Vec<RoomRoster>;
}
