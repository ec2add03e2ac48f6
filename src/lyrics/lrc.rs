//! LRC document formatting and sidecar output

use anyhow::{Context, Result};
use std::path::Path;

use super::parse::LyricLine;

/// Format one timeline entry as an LRC line with a centisecond timestamp
pub fn format_lrc_line(time_seconds: f64, text: &str) -> String {
    let minutes = (time_seconds / 60.0) as u32;
    let seconds = (time_seconds % 60.0) as u32;
    let centis = ((time_seconds % 1.0) * 100.0) as u32;
    format!("[{minutes:02}:{seconds:02}.{centis:02}]{text}")
}

/// Render a full timeline as a newline-terminated LRC document
pub fn lrc_document(lines: &[LyricLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&format_lrc_line(line.time, &line.text));
        out.push('\n');
    }
    out
}

/// Write (or overwrite) an `.lrc` sidecar file
pub async fn write_lrc(path: &Path, lines: &[LyricLine]) -> Result<()> {
    tokio::fs::write(path, lrc_document(lines))
        .await
        .with_context(|| format!("Failed to write lyrics to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_basic() {
        assert_eq!(format_lrc_line(12.5, "Hello"), "[00:12.50]Hello");
    }

    #[test]
    fn test_format_minutes_and_centis() {
        assert_eq!(format_lrc_line(75.34, "x"), "[01:15.34]x");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_lrc_line(0.0, ""), "[00:00.00]");
    }

    #[test]
    fn test_document_newline_terminated() {
        let lines = vec![LyricLine::new(1.0, "a"), LyricLine::new(2.5, "b")];
        assert_eq!(lrc_document(&lines), "[00:01.00]a\n[00:02.50]b\n");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("song.lrc");

        write_lrc(&path, &[LyricLine::new(1.0, "first run")])
            .await
            .unwrap();
        write_lrc(&path, &[LyricLine::new(2.0, "second run")])
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[00:02.00]second run\n");
    }
}
