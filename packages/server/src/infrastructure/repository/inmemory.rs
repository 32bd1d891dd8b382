//! InMemory Relay Repository 実装
//!
//! ドメイン層が定義する RelayRepository trait の具体的な実装。
//! 接続テーブルとルームテーブルを一つの Mutex で保護し、
//! 割り当てとメンバー集合の更新が失われないようにしています。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Connection, ConnectionId, DisplayName, RelayRepository, RepositoryError, Room, RoomId,
    RoomRoster, Timestamp,
};

#[derive(Debug, Default)]
struct RelayTables {
    connections: HashMap<ConnectionId, Connection>,
    rooms: HashMap<RoomId, Room>,
}

impl RelayTables {
    /// メンバーを外し、空になったルームを削除
    fn detach_member(&mut self, room_id: &RoomId, id: &ConnectionId) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.remove_member(id);
            if room.is_empty() {
                self.rooms.remove(room_id);
                tracing::debug!("Room '{}' is empty and was pruned", room_id);
            }
        }
    }
}

/// インメモリ Relay Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryRelayRepository {
    tables: Mutex<RelayTables>,
}

impl InMemoryRelayRepository {
    /// 新しい InMemoryRelayRepository を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelayRepository for InMemoryRelayRepository {
    async fn insert_connection(&self, connection: Connection) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.connections.contains_key(&connection.id) {
            return Err(RepositoryError::DuplicateConnection(
                connection.id.to_string(),
            ));
        }
        tables.connections.insert(connection.id, connection);
        Ok(())
    }

    async fn get_connection(&self, id: &ConnectionId) -> Option<Connection> {
        let tables = self.tables.lock().await;
        tables.connections.get(id).cloned()
    }

    async fn set_display_name(
        &self,
        id: &ConnectionId,
        name: DisplayName,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        let connection = tables
            .connections
            .get_mut(id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(id.to_string()))?;
        connection.set_display_name(name)?;
        Ok(())
    }

    async fn remove_connection(&self, id: &ConnectionId) -> Option<Connection> {
        let mut tables = self.tables.lock().await;
        let connection = tables.connections.remove(id)?;
        if let Some(room_id) = &connection.room {
            tables.detach_member(room_id, id);
        }
        Some(connection)
    }

    async fn count_connections(&self) -> usize {
        let tables = self.tables.lock().await;
        tables.connections.len()
    }

    async fn assign_room(
        &self,
        id: &ConnectionId,
        room_id: RoomId,
        timestamp: Timestamp,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.tables.lock().await;
        let RelayTables { connections, rooms } = &mut *guard;

        let connection = connections
            .get_mut(id)
            .ok_or_else(|| RepositoryError::ConnectionNotFound(id.to_string()))?;
        connection.assign_room(room_id.clone())?;

        let mut created = false;
        let room = rooms.entry(room_id.clone()).or_insert_with(|| {
            created = true;
            Room::new(room_id, timestamp)
        });
        room.add_member(*id);

        Ok(created)
    }

    async fn release_room(&self, id: &ConnectionId) -> Option<RoomId> {
        let mut tables = self.tables.lock().await;
        let room_id = tables.connections.get_mut(id)?.clear_room()?;
        tables.detach_member(&room_id, id);
        Some(room_id)
    }

    async fn room_members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        let tables = self.tables.lock().await;
        tables
            .rooms
            .get(room_id)
            .map(Room::member_ids)
            .unwrap_or_default()
    }

    async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        let tables = self.tables.lock().await;
        tables.rooms.get(room_id).cloned()
    }

    async fn list_rosters(&self) -> Vec<RoomRoster> {
        let tables = self.tables.lock().await;
        let mut rosters: Vec<RoomRoster> = tables
            .rooms
            .values()
            .map(|room| {
                let mut members: Vec<Connection> = room
                    .member_ids()
                    .iter()
                    .filter_map(|id| tables.connections.get(id).cloned())
                    .collect();
                members.sort_by_key(|c| c.connected_at);
                RoomRoster {
                    id: room.id.clone(),
                    created_at: room.created_at,
                    members,
                }
            })
            .collect();
        rosters.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        rosters
    }
}
