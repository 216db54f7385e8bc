//! Client configuration.

use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;

/// Bounded reconnection with a fixed interval between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, retry_interval: Duration) -> Self {
        Self {
            // 少なくとも 1 回は接続を試みる
            max_attempts: max_attempts.max(1),
            retry_interval,
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
        )
    }
}
