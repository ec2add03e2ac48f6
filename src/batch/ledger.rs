//! Append-only failure ledger

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Ledger file name, shared by every run against the same directory
pub const LEDGER_FILE_NAME: &str = "!#_FAILED_LIST.txt";

const LEDGER_HEADER: &str = "\
Tracks that could not be downloaded are listed below.
Possible causes:
1. pay-per-track release
2. track removed from the catalog
3. region restriction (VPN)
4. network problems
5. VIP-only track on a non-VIP account
=== === === === === === === === === === === ===

";

/// Append-only, human-readable failure log
///
/// Entries are never read back, deduplicated or rewritten; append order is
/// the record order. The explanatory header is written once, before the
/// first entry.
pub struct FailureLedger {
    path: PathBuf,
}

impl FailureLedger {
    pub fn new(download_path: &Path) -> Self {
        Self {
            path: download_path.join(LEDGER_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one failure record
    pub fn record(&self, track_id: u64, name: &str, artist: &str, reason: &str) -> Result<()> {
        let is_new = !self.path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        if is_new {
            file.write_all(LEDGER_HEADER.as_bytes())
                .context("Failed to write ledger header")?;
        }

        writeln!(
            file,
            "ID: {track_id} - track: {name} - artist: {artist} - reason: {reason}"
        )
        .context("Failed to append ledger entry")?;

        debug!("Recorded failure for track {track_id}: {reason}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_once() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::new(tmp.path());

        ledger.record(1, "one", "A", "HTTP error: status 404").unwrap();
        ledger.record(2, "two", "B", "stalled").unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.matches("Possible causes").count(), 1);
        assert!(content.starts_with("Tracks that could not be downloaded"));
    }

    #[test]
    fn test_entries_appended_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::new(tmp.path());

        ledger.record(1, "one", "A", "first").unwrap();
        ledger.record(2, "two", "B", "second").unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        let first = content.find("ID: 1 - track: one - artist: A - reason: first");
        let second = content.find("ID: 2 - track: two - artist: B - reason: second");
        assert!(first.unwrap() < second.unwrap());
    }

    #[test]
    fn test_duplicate_records_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = FailureLedger::new(tmp.path());

        ledger.record(7, "same", "X", "stalled").unwrap();
        ledger.record(7, "same", "X", "stalled").unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.matches("ID: 7").count(), 2);
    }
}
