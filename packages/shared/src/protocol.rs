//! Wire events exchanged between the relay server and its clients.
//!
//! Every WebSocket text frame carries one JSON event:
//!
//! ```text
//! {"event": "join_room", "data": {"roomName": "room1", "username": "Alice"}}
//! ```
//!
//! Event names are snake_case, payload fields are camelCase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while encoding or decoding a wire event
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON or does not match any known event
    #[error("Malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Payload of `join_room`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_name: String,
    pub username: String,
}

/// Payload of `send_message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_name: String,
    pub username: String,
    pub message: String,
}

/// Payload of `receive_message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveMessagePayload {
    pub username: String,
    pub message: String,
}

/// Payload of `room_joined`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedPayload {
    pub room_name: String,
}

/// Machine readable reason carried by an `error` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The connection already has a room assignment
    AlreadyInRoom,
    /// The action is not allowed in the connection's current state
    InvalidState,
    /// The requested room name is not acceptable
    InvalidRoom,
    /// The sender is not a member of the room it addressed
    NotInRoom,
}

/// Payload of `error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

/// Events sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomPayload),
    SendMessage(SendMessagePayload),
}

/// Events pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ReceiveMessage(ReceiveMessagePayload),
    RoomJoined(RoomJoinedPayload),
    Error(ErrorPayload),
}

impl ClientEvent {
    /// Build a `join_room` event
    pub fn join_room(room_name: impl Into<String>, username: impl Into<String>) -> Self {
        Self::JoinRoom(JoinRoomPayload {
            room_name: room_name.into(),
            username: username.into(),
        })
    }

    /// Build a `send_message` event
    pub fn send_message(
        room_name: impl Into<String>,
        username: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SendMessage(SendMessagePayload {
            room_name: room_name.into(),
            username: username.into(),
            message: message.into(),
        })
    }

    /// Wire name of this event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join_room",
            Self::SendMessage(_) => "send_message",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerEvent {
    /// Build a `receive_message` event
    pub fn receive_message(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReceiveMessage(ReceiveMessagePayload {
            username: username.into(),
            message: message.into(),
        })
    }

    /// Build a `room_joined` event
    pub fn room_joined(room_name: impl Into<String>) -> Self {
        Self::RoomJoined(RoomJoinedPayload {
            room_name: room_name.into(),
        })
    }

    /// Build an `error` event
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            code,
            message: message.into(),
        })
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_room_wire_format() {
        // テスト項目: join_room イベントが event/data 形式・camelCase でエンコードされる
        // given (前提条件):
        let event = ClientEvent::join_room("room1", "Alice");

        // when (操作):
        let json = event.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        // then (期待する結果):
        assert_eq!(value["event"], "join_room");
        assert_eq!(value["data"]["roomName"], "room1");
        assert_eq!(value["data"]["username"], "Alice");
    }

    #[test]
    fn test_decode_send_message() {
        // テスト項目: クライアントが送る send_message を正しくデコードできる
        // given (前提条件):
        let text = r#"{"event":"send_message","data":{"roomName":"room1","username":"Bob","message":"hi"}}"#;

        // when (操作):
        let event = ClientEvent::from_json(text).unwrap();

        // then (期待する結果):
        assert_eq!(event, ClientEvent::send_message("room1", "Bob", "hi"));
        assert_eq!(event.name(), "send_message");
    }

    #[test]
    fn test_decode_missing_field_is_malformed() {
        // テスト項目: 必須フィールドが欠けたイベントは Malformed エラーになる
        // given (前提条件):
        let text = r#"{"event":"send_message","data":{"roomName":"room1","username":"Bob"}}"#;

        // when (操作):
        let result = ClientEvent::from_json(text);

        // then (期待する結果):
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_decode_unknown_event_is_malformed() {
        // テスト項目: 未知のイベント名は Malformed エラーになる
        // given (前提条件):
        let text = r#"{"event":"leave_room","data":{"roomName":"room1"}}"#;

        // when (操作):
        let result = ClientEvent::from_json(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_receive_message_wire_format() {
        // テスト項目: receive_message は username と message のみを持つ
        // given (前提条件):
        let event = ServerEvent::receive_message("Bob", "hi");

        // when (操作):
        let json = event.to_json().unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"event":"receive_message","data":{"username":"Bob","message":"hi"}}"#
        );
    }

    #[test]
    fn test_error_event_code_is_snake_case() {
        // テスト項目: error イベントのコードが snake_case でエンコードされる
        // given (前提条件):
        let event = ServerEvent::error(ErrorCode::AlreadyInRoom, "already in room1");

        // when (操作):
        let json = event.to_json().unwrap();
        let decoded = ServerEvent::from_json(&json).unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""code":"already_in_room""#));
        assert_eq!(decoded, event);
    }
}
