//! Download directory preparation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(path)
}

/// Prepare the download directory, creating it if necessary
///
/// If the requested directory cannot be created, falls back once to
/// `./downloads`. Failure to create the fallback aborts the run.
pub fn prepare_download_dir(requested: &str) -> Result<PathBuf> {
    let trimmed = requested.trim().trim_matches(|c| c == '\'' || c == '"');
    let path = expand_home(trimmed);

    match ensure_dir(&path) {
        Ok(()) => Ok(path),
        Err(e) => {
            warn!("Failed to create {}: {e}. Using ./downloads", path.display());
            let fallback = PathBuf::from("downloads");
            ensure_dir(&fallback).context("Failed to create fallback download directory")?;
            Ok(fallback)
        }
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    debug!("Created directory: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_existing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = prepare_download_dir(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(dir, tmp.path());
    }

    #[test]
    fn test_prepare_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("music").join("batch");
        let dir = prepare_download_dir(nested.to_str().unwrap()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, nested);
    }

    #[test]
    fn test_prepare_strips_quotes() {
        let tmp = tempfile::tempdir().unwrap();
        let quoted = format!("'{}'", tmp.path().display());
        let dir = prepare_download_dir(&quoted).unwrap();
        assert_eq!(dir, tmp.path());
    }

    #[test]
    fn test_expand_home_passthrough() {
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
    }
}
