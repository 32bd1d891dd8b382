//! Domain layer for the relay server.
//!
//! This module contains business rules that are independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{Connection, Message, Room, RoomRoster};
pub use error::{ConnectionError, MessagePushError, RepositoryError, ValueObjectError};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::RelayRepository;
pub use value_object::{ConnectionId, DisplayName, MessageBody, RoomId, Timestamp};
