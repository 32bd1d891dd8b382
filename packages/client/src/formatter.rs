//! Message formatting utilities for client display.

use belltower_shared::{protocol::ErrorCode, time::timestamp_to_clock_time};

const RULE: &str = "------------------------------------------------------------";
const DOUBLE_RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the name prompt banner
    pub fn format_welcome() -> String {
        format!(
            "\n{}\nWelcome to Belltower.\nEnter your name to continue. \
             Type /ack to silence the alarm, /quit to exit.\n{}\n",
            DOUBLE_RULE, DOUBLE_RULE
        )
    }

    /// Format the room picker
    ///
    /// Rooms are numbered from 1; either the number or the name can be typed.
    pub fn format_room_picker(rooms: &[String], last_error: Option<&str>) -> String {
        let mut output = String::new();
        if let Some(reason) = last_error {
            output.push_str(&format!("\n! Could not join: {}\n", reason));
        }
        output.push_str(&format!("\n{}\nSelect a Room:\n", DOUBLE_RULE));
        for (index, room) in rooms.iter().enumerate() {
            output.push_str(&format!("  {}) {}\n", index + 1, room));
        }
        output.push_str(DOUBLE_RULE);
        output.push('\n');
        output
    }

    /// Format the confirmation that the server accepted the join
    pub fn format_joined(room: &str) -> String {
        format!("\n* Joined {}. Type a message and press Enter to send.\n", room)
    }

    /// Format a received chat message
    ///
    /// # Arguments
    ///
    /// * `username` - The display name of the sender
    /// * `message` - The message body
    /// * `received_at` - Unix timestamp when the message arrived (milliseconds)
    pub fn format_message(username: &str, message: &str, received_at: i64) -> String {
        format!(
            "\n{}\n[{}] {}: {}\n{}\n",
            RULE,
            timestamp_to_clock_time(received_at),
            username,
            message,
            RULE
        )
    }

    /// Format a notification banner
    pub fn format_notification(title: &str, body: &str) -> String {
        format!("\n(!) {} | {}\n", title, body)
    }

    /// Format an error reply from the server
    pub fn format_server_error(code: ErrorCode, message: &str) -> String {
        let label = match code {
            ErrorCode::AlreadyInRoom => "already in room",
            ErrorCode::InvalidState => "invalid state",
            ErrorCode::InvalidRoom => "invalid room",
            ErrorCode::NotInRoom => "not in room",
        };
        format!("\n! Server rejected the request ({}): {}\n", label, message)
    }

    /// Format a locally rejected input
    pub fn format_rejected(reason: &str) -> String {
        format!("! {}\n", reason)
    }
}
