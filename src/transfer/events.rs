//! Progress events sent from the transfer engine to its consumer
//!
//! The engine never touches the terminal; it emits these events over a
//! channel and the renderer (or a test harness) decides what to do with
//! them.

use std::time::Duration;

/// Events emitted during one logical transfer (all attempts included)
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// An attempt is about to issue its request
    Started {
        file_name: String,
        /// Expected payload size, 0 when unknown
        total_bytes: u64,
        /// 1-based attempt counter
        attempt: u8,
    },
    /// A chunk arrived; counters were updated
    Progress(ProgressTick),
    /// An attempt failed but the retry policy permits another
    AttemptFailed { attempt: u8, reason: String },
    /// The transfer finished successfully
    Completed {
        bytes_downloaded: u64,
        elapsed: Duration,
    },
}

/// Live transfer counters, recomputed once per chunk
#[derive(Debug, Clone, Copy)]
pub struct ProgressTick {
    pub bytes_downloaded: u64,
    /// 0 when the total is unknown
    pub bytes_total: u64,
    pub elapsed: Duration,
    /// Bytes per second since the attempt started
    pub throughput: f64,
    /// Remaining time estimate, `None` when not computable
    pub eta: Option<Duration>,
}

impl ProgressTick {
    /// Completion fraction in `[0, 1]`, `None` when the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.bytes_total == 0 {
            return None;
        }
        Some((self.bytes_downloaded as f64 / self.bytes_total as f64).min(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_unknown_total() {
        let tick = ProgressTick {
            bytes_downloaded: 10,
            bytes_total: 0,
            elapsed: Duration::from_secs(1),
            throughput: 10.0,
            eta: None,
        };
        assert!(tick.fraction().is_none());
    }

    #[test]
    fn test_fraction_clamped() {
        let tick = ProgressTick {
            bytes_downloaded: 150,
            bytes_total: 100,
            elapsed: Duration::from_secs(1),
            throughput: 150.0,
            eta: None,
        };
        assert_eq!(tick.fraction(), Some(1.0));
    }
}
