//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use belltower_shared::limits::{MAX_ROOM_ID_LEN, exceeds};

use crate::error::ClientError;

/// Input command recognised in every state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Silence the alarm
    Acknowledge,
    /// Leave the client
    Quit,
    /// Anything else; interpreted by the session state
    Text(String),
}

/// Classify one line typed by the user.
pub fn parse_input(line: &str) -> InputCommand {
    match line.trim() {
        "/ack" => InputCommand::Acknowledge,
        "/quit" => InputCommand::Quit,
        _ => InputCommand::Text(line.to_string()),
    }
}

/// Resolve a room choice typed as a 1-based number or as the room name.
pub fn resolve_room_choice<'a>(rooms: &'a [String], input: &'a str) -> &'a str {
    let input = input.trim();
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| rooms.get(index))
        .map(String::as_str)
        .unwrap_or(input)
}

/// Validate one room offered in the room picker.
///
/// Returns the trimmed name, or a message for the argument parser when the
/// relay would refuse the room.
pub fn parse_room_name(value: &str) -> Result<String, String> {
    let room = value.trim();
    if room.is_empty() {
        return Err("room name must not be empty".to_string());
    }
    if exceeds(room, MAX_ROOM_ID_LEN) {
        return Err(format!(
            "room name must be at most {} characters",
            MAX_ROOM_ID_LEN
        ));
    }
    Ok(room.to_string())
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Only transport failures are worth a new session
    if !matches!(error, ClientError::ConnectionError(_)) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;

    #[test]
    fn test_parse_input_commands() {
        // テスト項目: /ack と /quit がコマンドとして認識され、それ以外はそのまま渡される
        // given (前提条件):
        let lines = ["/ack", " /quit ", "  hello "];

        // when (操作):
        let parsed: Vec<InputCommand> = lines.iter().map(|line| parse_input(line)).collect();

        // then (期待する結果):
        assert_eq!(
            parsed,
            vec![
                InputCommand::Acknowledge,
                InputCommand::Quit,
                InputCommand::Text("  hello ".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_room_choice_by_number_and_name() {
        // テスト項目: ルームは番号でも名前でも選択できる
        // given (前提条件):
        let rooms = vec!["room1".to_string(), "room2".to_string()];

        // when (操作):
        let by_number = resolve_room_choice(&rooms, "2");
        let by_name = resolve_room_choice(&rooms, " room1 ");
        let out_of_range = resolve_room_choice(&rooms, "3");
        let zero = resolve_room_choice(&rooms, "0");

        // then (期待する結果):
        assert_eq!(by_number, "room2");
        assert_eq!(by_name, "room1");
        assert_eq!(out_of_range, "3");
        assert_eq!(zero, "0");
    }

    #[test]
    fn test_parse_room_name_trims_valid_names() {
        // テスト項目: 有効なルーム名は前後の空白を除いて受け付けられる
        // given (前提条件):
        let raw = " lobby ";

        // when (操作):
        let result = parse_room_name(raw);

        // then (期待する結果):
        assert_eq!(result, Ok("lobby".to_string()));
    }

    #[test]
    fn test_parse_room_name_rejects_empty_and_too_long() {
        // テスト項目: 空のルーム名と上限を超えるルーム名は起動時に拒否される
        // given (前提条件):
        let at_limit = "r".repeat(MAX_ROOM_ID_LEN);
        let too_long = "r".repeat(MAX_ROOM_ID_LEN + 1);

        // when (操作):
        let empty = parse_room_name("  ");
        let accepted = parse_room_name(&at_limit);
        let rejected = parse_room_name(&too_long);

        // then (期待する結果):
        assert!(empty.is_err());
        assert_eq!(accepted, Ok(at_limit));
        assert!(rejected.is_err());
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 再接続回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 3, 5);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 再接続回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 5, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_first_attempt() {
        // テスト項目: 初回の再接続試行では再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, 5);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_not_reconnect_on_session_error() {
        // テスト項目: 通信以外のエラーでは再接続しない
        // given (前提条件):
        let error = ClientError::Session(SessionError::InvalidState("bad name".to_string()));

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, 5);

        // then (期待する結果):
        assert!(!result);
    }
}
