//! Retry policy for transfer attempts

use super::error::TransferError;

/// Default number of retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: u8 = 2;

/// Decides whether a failed attempt may be restarted from byte zero
///
/// A policy allows at most `max_retries + 1` total attempts. There is no
/// backoff between attempts; the stall window itself bounds how fast dead
/// attempts cycle.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u8) -> Self {
        Self { max_retries }
    }

    /// Total attempts this policy permits
    pub fn max_attempts(&self) -> u8 {
        self.max_retries.saturating_add(1)
    }

    /// Whether to retry after `attempt` (1-based) failed with `error`
    pub fn should_retry(&self, error: &TransferError, attempt: u8) -> bool {
        error.is_retryable() && attempt < self.max_attempts()
    }
}
