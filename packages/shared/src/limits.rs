//! Length limits enforced by the relay and checked up front by the client.
//!
//! All limits count characters, not bytes, and apply after trimming for names
//! and room ids.

/// Maximum length of a display name
pub const MAX_DISPLAY_NAME_LEN: usize = 50;
/// Maximum length of a room identifier
pub const MAX_ROOM_ID_LEN: usize = 64;
/// Maximum length of a message body
pub const MAX_MESSAGE_BODY_LEN: usize = 2000;

/// Returns `true` if `value` is longer than `max` characters.
pub fn exceeds(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceeds_counts_characters() {
        // テスト項目: 長さはバイト数ではなく文字数で数えられる
        // given (前提条件):
        let name = "あ".repeat(MAX_DISPLAY_NAME_LEN);

        // when (操作):
        let at_limit = exceeds(&name, MAX_DISPLAY_NAME_LEN);
        let over_limit = exceeds(&format!("{}a", name), MAX_DISPLAY_NAME_LEN);

        // then (期待する結果):
        assert!(!at_limit);
        assert!(over_limit);
    }
}
