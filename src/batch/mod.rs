//! Batch orchestration and the failure ledger

pub mod ledger;
pub mod runner;

pub use ledger::FailureLedger;
pub use runner::{BatchConfig, BatchRunner, BatchSummary, LyricsMode};
