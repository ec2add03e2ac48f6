//! Streaming transfer engine with retry, stall detection and progress events

pub mod engine;
pub mod error;
pub mod events;
pub mod retry;

pub use engine::{TransferEngine, TransferOptions, TransferSummary, DEFAULT_STALL_TIMEOUT};
pub use error::TransferError;
pub use events::{ProgressTick, TransferEvent};
pub use retry::RetryPolicy;
