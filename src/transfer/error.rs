//! Transfer failure taxonomy
//!
//! Classifies everything that can go wrong while moving one payload:
//! resource errors (bad HTTP status) are terminal for the item, while
//! transport errors, stalls and short bodies are transient and feed the
//! retry policy.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single transfer (or transfer attempt)
#[derive(Debug, Error)]
pub enum TransferError {
    /// Non-200 response: the resource itself is invalid, never retried
    #[error("HTTP error: status {0}")]
    Http(reqwest::StatusCode),

    /// Network-layer failure (connect, DNS, reset, read error)
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// No byte progress for the configured stall window
    #[error("stalled: no data received for {}s", .0.as_secs())]
    Stalled(Duration),

    /// Body ended before the expected byte count was reached
    #[error("incomplete body: received {received} of {expected} bytes")]
    Incomplete { received: u64, expected: u64 },

    /// Local filesystem failure writing the destination
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Whether the retry policy may restart the transfer from byte zero
    ///
    /// Transport errors, stalls and short bodies are transient. A bad
    /// status means the link is dead, and a local I/O failure will not
    /// heal by re-downloading.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransferError::Transport(_)
                | TransferError::Stalled(_)
                | TransferError::Incomplete { .. }
        )
    }
}
