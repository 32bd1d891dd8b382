//! Domain errors.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Display name must not be empty")]
    EmptyDisplayName,

    #[error("Display name is too long ({actual} > {max} characters)")]
    DisplayNameTooLong { max: usize, actual: usize },

    #[error("Room id must not be empty")]
    EmptyRoomId,

    #[error("Room id is too long ({actual} > {max} characters)")]
    RoomIdTooLong { max: usize, actual: usize },

    #[error("Message body must not be empty")]
    EmptyMessageBody,

    #[error("Message body is too long ({actual} > {max} characters)")]
    MessageBodyTooLong { max: usize, actual: usize },
}

/// Connection entity state transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("Display name is already set")]
    DisplayNameAlreadySet,

    #[error("Connection is already in room '{0}'")]
    AlreadyInRoom(String),
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Message push errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}
