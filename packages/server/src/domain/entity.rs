//! Domain entities: connections, rooms and messages.

use std::collections::HashSet;

use serde::Serialize;

use super::{
    error::ConnectionError,
    value_object::{ConnectionId, DisplayName, MessageBody, RoomId, Timestamp},
};

/// One live client link.
///
/// Display name and room assignment start unset and can each be set exactly
/// once. The room is only cleared again while the connection is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub display_name: Option<DisplayName>,
    pub room: Option<RoomId>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            display_name: None,
            room: None,
            connected_at,
        }
    }

    /// Record the display name. Fails if it was already set.
    pub fn set_display_name(&mut self, name: DisplayName) -> Result<(), ConnectionError> {
        if self.display_name.is_some() {
            return Err(ConnectionError::DisplayNameAlreadySet);
        }
        self.display_name = Some(name);
        Ok(())
    }

    /// Record the room assignment. Fails if the connection already has one.
    pub fn assign_room(&mut self, room_id: RoomId) -> Result<(), ConnectionError> {
        if let Some(current) = &self.room {
            return Err(ConnectionError::AlreadyInRoom(current.as_str().to_string()));
        }
        self.room = Some(room_id);
        Ok(())
    }

    /// Drop the room assignment, returning the room that was left
    pub fn clear_room(&mut self) -> Option<RoomId> {
        self.room.take()
    }

    pub fn is_in_room(&self, room_id: &RoomId) -> bool {
        self.room.as_ref() == Some(room_id)
    }
}

/// A named broadcast domain, created lazily on first join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    members: HashSet<ConnectionId>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            members: HashSet::new(),
            created_at,
        }
    }

    /// Add a member. Returns `false` if it was already present.
    pub fn add_member(&mut self, connection_id: ConnectionId) -> bool {
        self.members.insert(connection_id)
    }

    /// Remove a member. Returns `false` if it was not present.
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        self.members.remove(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains(connection_id)
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().copied().collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Read model of a room with its members resolved, used by the inspection API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRoster {
    pub id: RoomId,
    pub created_at: Timestamp,
    /// Members ordered by connect time
    pub members: Vec<Connection>,
}

/// A chat message on its way through the broadcaster. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: DisplayName,
    pub room: RoomId,
    pub body: MessageBody,
}

impl Message {
    pub fn new(sender: DisplayName, room: RoomId, body: MessageBody) -> Self {
        Self { sender, room, body }
    }
}
