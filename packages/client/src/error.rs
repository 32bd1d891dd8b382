//! Error types for the Belltower client.

use belltower_shared::protocol::ProtocolError;
use thiserror::Error;

/// Session state machine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The action is not allowed in the current state, or its input was rejected
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Delivery alert errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    /// The user (or configuration) refused visual notifications
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The alarm could not be created or played
    #[error("Alarm error: {0}")]
    Alarm(String),
}

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
