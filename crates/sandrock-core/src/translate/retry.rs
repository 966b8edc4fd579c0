//! Retry strategies for transient translation failures

use std::fmt::Debug;
use std::time::Duration;

pub const MAX_RETRIES: u32 = 3;
pub const INITIAL_BACKOFF_MS: u64 = 100;
pub const MAX_BACKOFF_MS: u64 = 5000;

/// Decides whether, and after how long, a failed call is retried
pub trait RetryStrategy: Send + Sync + Debug {
    /// Delay before retry number `retry` (1-based), or `None` to give up
    fn delay(&self, retry: u32) -> Option<Duration>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn delay(&self, _retry: u32) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    pub delay: Duration,
    pub max_retries: u32,
}

impl RetryStrategy for FixedDelay {
    fn delay(&self, retry: u32) -> Option<Duration> {
        (retry <= self.max_retries).then_some(self.delay)
    }
}

/// Doubling delay, capped at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
    pub max_retries: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(INITIAL_BACKOFF_MS),
            max: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_RETRIES,
        }
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn delay(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        Some(self.initial.saturating_mul(factor).min(self.max))
    }
}
