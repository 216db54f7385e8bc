//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

/// Connection lifecycle of a [`crate::RelayClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Check if the client should attempt another connection.
///
/// # Arguments
///
/// * `current_attempt` - The number of attempts already made (1-indexed)
/// * `max_attempts` - The maximum number of attempts allowed
///
/// # Returns
///
/// `true` if another attempt should be made, `false` otherwise
pub fn should_attempt_reconnect(current_attempt: u32, max_attempts: u32) -> bool {
    current_attempt < max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_disconnected() {
        // テスト項目: 初期状態は Disconnected
        // given (前提条件):
        // when (操作):
        let state = ConnectionState::default();

        // then (期待する結果):
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(!state.is_connected());
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 試行回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let current_attempt = 3;

        // when (操作):
        let result = should_attempt_reconnect(current_attempt, 5);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 試行回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let current_attempt = 5;

        // when (操作):
        let result = should_attempt_reconnect(current_attempt, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_single_attempt_policy() {
        // テスト項目: 上限 1 回の場合、最初の失敗で諦める
        // given (前提条件):
        let current_attempt = 1;

        // when (操作):
        let result = should_attempt_reconnect(current_attempt, 1);

        // then (期待する結果):
        assert!(!result);
    }
}
