//! Client session state machine.
//!
//! Tracks which screen the user is on and which events the client may emit:
//! name prompt, room picker, then the chat view. The machine is transport
//! agnostic; the runner feeds it user input, decoded server events and the
//! passage of time.

use std::{sync::Arc, time::Duration};

use belltower_shared::{
    limits::{MAX_DISPLAY_NAME_LEN, MAX_MESSAGE_BODY_LEN, exceeds},
    protocol::{ClientEvent, ErrorCode, ErrorPayload, ReceiveMessagePayload, ServerEvent},
    time::Clock,
};

use crate::error::SessionError;

/// Default time to wait for `room_joined` before falling back to the room picker
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Session states, in the order a session moves through them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No display name yet
    Unauthenticated,
    /// Display name fixed, no room chosen
    Named { username: String },
    /// `join_room` sent, waiting for the acknowledgment
    Joining {
        username: String,
        room: String,
        deadline_millis: i64,
    },
    /// Joined; terminal for this session
    Chatting { username: String, room: String },
}

/// What the user should currently be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    NamePrompt,
    RoomPicker { rooms: Vec<String> },
    Chat { room: String, pending: bool },
}

/// Effect of a server event on the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// The join was acknowledged
    Joined { room: String },
    /// The join was refused; the session is back on the room picker, or on the
    /// name prompt when the server refused the display name
    JoinFailed { reason: String },
    /// A chat message to show (and alert on)
    Delivered(ReceiveMessagePayload),
    /// An error reply unrelated to a pending join
    ServerError(ErrorPayload),
    /// The event does not apply to the current state
    Ignored,
}

pub struct ClientSession {
    state: SessionState,
    rooms: Vec<String>,
    draft: String,
    last_error: Option<String>,
    join_timeout_millis: i64,
    clock: Arc<dyn Clock>,
}

impl ClientSession {
    pub fn new(rooms: Vec<String>, join_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            rooms,
            draft: String::new(),
            last_error: None,
            join_timeout_millis: i64::try_from(join_timeout.as_millis()).unwrap_or(i64::MAX),
            clock,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Reason of the last failed join, cleared by the next successful one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Unauthenticated => None,
            SessionState::Named { username }
            | SessionState::Joining { username, .. }
            | SessionState::Chatting { username, .. } => Some(username),
        }
    }

    pub fn view(&self) -> SessionView {
        match &self.state {
            SessionState::Unauthenticated => SessionView::NamePrompt,
            SessionState::Named { .. } => SessionView::RoomPicker {
                rooms: self.rooms.clone(),
            },
            SessionState::Joining { room, .. } => SessionView::Chat {
                room: room.clone(),
                pending: true,
            },
            SessionState::Chatting { room, .. } => SessionView::Chat {
                room: room.clone(),
                pending: false,
            },
        }
    }

    /// Fix the display name. Only valid before a name was chosen.
    pub fn submit_name(&mut self, name: &str) -> Result<(), SessionError> {
        if self.state != SessionState::Unauthenticated {
            return Err(SessionError::InvalidState(
                "display name is already set".to_string(),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidState(
                "display name must not be empty".to_string(),
            ));
        }
        if exceeds(name, MAX_DISPLAY_NAME_LEN) {
            return Err(SessionError::InvalidState(format!(
                "display name must be at most {} characters",
                MAX_DISPLAY_NAME_LEN
            )));
        }

        self.state = SessionState::Named {
            username: name.to_string(),
        };
        Ok(())
    }

    /// Pick one of the offered rooms and produce the `join_room` event.
    ///
    /// The chat view is shown right away; the join is confirmed later by
    /// [`handle_server_event`](Self::handle_server_event).
    pub fn select_room(&mut self, room: &str) -> Result<ClientEvent, SessionError> {
        let SessionState::Named { username } = &self.state else {
            return Err(SessionError::InvalidState(
                "a room can only be selected after choosing a name".to_string(),
            ));
        };
        let room = room.trim();
        if !self.rooms.iter().any(|offered| offered == room) {
            return Err(SessionError::InvalidState(format!(
                "'{}' is not one of the offered rooms",
                room
            )));
        }

        let username = username.clone();
        let event = ClientEvent::join_room(room, username.as_str());
        self.state = SessionState::Joining {
            username,
            room: room.to_string(),
            deadline_millis: self.clock.now_millis().saturating_add(self.join_timeout_millis),
        };
        Ok(event)
    }

    /// Send the current draft.
    ///
    /// A blank draft emits nothing and is kept as is; an over-long draft is
    /// rejected and kept. Allowed while the join is still pending: the server
    /// handles one connection's events in order.
    pub fn submit_message(&mut self) -> Result<Option<ClientEvent>, SessionError> {
        let (username, room) = match &self.state {
            SessionState::Joining { username, room, .. }
            | SessionState::Chatting { username, room } => (username, room),
            _ => {
                return Err(SessionError::InvalidState(
                    "messages can only be sent after selecting a room".to_string(),
                ));
            }
        };
        if self.draft.trim().is_empty() {
            return Ok(None);
        }
        if exceeds(&self.draft, MAX_MESSAGE_BODY_LEN) {
            return Err(SessionError::InvalidState(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_BODY_LEN
            )));
        }

        let event = ClientEvent::send_message(room.as_str(), username.as_str(), self.draft.as_str());
        self.draft.clear();
        Ok(Some(event))
    }

    /// Apply one decoded server event.
    pub fn handle_server_event(&mut self, event: &ServerEvent) -> SessionUpdate {
        match event {
            ServerEvent::RoomJoined(payload) => self.confirm_join(&payload.room_name),
            ServerEvent::ReceiveMessage(payload) => match &self.state {
                SessionState::Joining { room, .. } => {
                    // Any delivery proves the membership.
                    let room = room.clone();
                    self.confirm_join(&room);
                    SessionUpdate::Delivered(payload.clone())
                }
                SessionState::Chatting { .. } => SessionUpdate::Delivered(payload.clone()),
                _ => SessionUpdate::Ignored,
            },
            ServerEvent::Error(payload) => match &self.state {
                SessionState::Joining { username, .. } => {
                    let reason = describe_error(payload);
                    // The name is fixed per session; a refused name has to be chosen again.
                    self.state = if payload.code == ErrorCode::InvalidState {
                        SessionState::Unauthenticated
                    } else {
                        SessionState::Named {
                            username: username.clone(),
                        }
                    };
                    self.last_error = Some(reason.clone());
                    SessionUpdate::JoinFailed { reason }
                }
                _ => SessionUpdate::ServerError(payload.clone()),
            },
        }
    }

    /// Deadline of the pending join, if any (Unix millis)
    pub fn join_deadline(&self) -> Option<i64> {
        match &self.state {
            SessionState::Joining {
                deadline_millis, ..
            } => Some(*deadline_millis),
            _ => None,
        }
    }

    /// Fall back to the room picker once the pending join has expired.
    ///
    /// Returns `true` if the fallback happened.
    pub fn check_join_timeout(&mut self) -> bool {
        let SessionState::Joining {
            username,
            deadline_millis,
            ..
        } = &self.state
        else {
            return false;
        };
        if self.clock.now_millis() < *deadline_millis {
            return false;
        }

        self.state = SessionState::Named {
            username: username.clone(),
        };
        self.last_error = Some("timed out waiting for the server to confirm the join".to_string());
        true
    }

    fn confirm_join(&mut self, room_name: &str) -> SessionUpdate {
        let username = match &self.state {
            // A late acknowledgment after a timeout still wins: the server did assign us.
            SessionState::Joining { username, .. } | SessionState::Named { username } => {
                username.clone()
            }
            _ => return SessionUpdate::Ignored,
        };

        self.state = SessionState::Chatting {
            username,
            room: room_name.to_string(),
        };
        self.last_error = None;
        SessionUpdate::Joined {
            room: room_name.to_string(),
        }
    }
}

fn describe_error(payload: &ErrorPayload) -> String {
    match payload.code {
        ErrorCode::AlreadyInRoom => format!("already in a room ({})", payload.message),
        _ => payload.message.clone(),
    }
}
