//! Sequential batch orchestration
//!
//! Processes items strictly one at a time; the ledger and the terminal
//! line have a single writer by construction. One item's failure is
//! recorded and the batch moves on.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::api::{CatalogClient, Quality, TrackDetail};
use crate::lyrics::{lrc_document, merge_timelines, parse_lrc, write_lrc};
use crate::tags;
use crate::transfer::{
    RetryPolicy, TransferEngine, TransferEvent, TransferOptions, DEFAULT_STALL_TIMEOUT,
};
use crate::ui::{progress, ProgressRenderer};
use crate::utils::sanitize_filename;

use super::ledger::FailureLedger;

/// Files with less decodable audio than this are flagged as previews
const MIN_PLAUSIBLE_DURATION: Duration = Duration::from_secs(35);

/// Where merged lyrics end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LyricsMode {
    /// Embed into the audio file's tags only
    Embed,
    /// Write a `.lrc` sidecar only
    File,
    /// Both embed and write the sidecar
    #[default]
    Both,
    /// Skip lyrics entirely
    None,
}

/// Batch-wide configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub download_path: PathBuf,
    pub quality: Quality,
    pub lyrics_mode: LyricsMode,
    pub max_retries: u8,
    pub stall_timeout: Duration,
}

impl BatchConfig {
    pub fn new(download_path: PathBuf, quality: Quality, lyrics_mode: LyricsMode) -> Self {
        Self {
            download_path,
            quality,
            lyrics_mode,
            max_retries: RetryPolicy::default().max_retries,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }
}

/// Counters for a finished batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub downloaded: usize,
    pub failed: usize,
    pub bytes_downloaded: u64,
}

/// Drives the per-item pipeline: resolve, transfer, verify, lyrics, tags
pub struct BatchRunner {
    client: CatalogClient,
    engine: TransferEngine,
    ledger: FailureLedger,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(client: CatalogClient, config: BatchConfig) -> Result<Self> {
        let engine = TransferEngine::new().context("Failed to create transfer engine")?;
        let ledger = FailureLedger::new(&config.download_path);
        Ok(Self {
            client,
            engine,
            ledger,
            config,
        })
    }

    /// Download every track of a playlist
    pub async fn run_playlist(&self, playlist_id: u64) -> Result<BatchSummary> {
        let tracks = self
            .client
            .get_playlist_tracks(playlist_id)
            .await
            .context("Failed to fetch playlist")?;

        if tracks.is_empty() {
            println!("{}", "Playlist contains no tracks.".yellow());
            return Ok(BatchSummary::default());
        }

        self.write_playlist_info(playlist_id, &tracks).await?;

        let total = tracks.len();
        let mut summary = BatchSummary::default();
        for (i, track) in tracks.iter().enumerate() {
            self.download_item(track, Some((i + 1, total)), &mut summary)
                .await;
        }
        Ok(summary)
    }

    /// Download a single track
    pub async fn run_track(&self, track_id: u64) -> Result<BatchSummary> {
        let track = self
            .client
            .get_track_detail(track_id)
            .await
            .context("Failed to fetch track detail")?;

        let mut summary = BatchSummary::default();
        self.download_item(&track, None, &mut summary).await;
        Ok(summary)
    }

    /// Process one item; failures are recorded, never propagated
    async fn download_item(
        &self,
        track: &TrackDetail,
        index: Option<(usize, usize)>,
        summary: &mut BatchSummary,
    ) {
        match self.try_download_item(track, index).await {
            Ok(bytes) => {
                summary.downloaded += 1;
                summary.bytes_downloaded += bytes;
            }
            Err(e) => {
                summary.failed += 1;
                self.record_failure(track, &format!("{e:#}"));
                println!(
                    "{}",
                    format!(
                        "× failed to download {} - {}, see {}",
                        track.name,
                        track.artist_names(),
                        super::ledger::LEDGER_FILE_NAME
                    )
                    .red()
                );
            }
        }
    }

    async fn try_download_item(
        &self,
        track: &TrackDetail,
        index: Option<(usize, usize)>,
    ) -> Result<u64> {
        let source = self
            .client
            .get_audio_source(track.id, self.config.quality)
            .await
            .context("failed to resolve download link")?;

        let url = source.url.clone().ok_or_else(|| {
            anyhow::anyhow!("no downloadable source (missing permissions or track delisted)")
        })?;

        let base_name = sanitize_filename(&format!("{} - {}", track.name, track.artist_names()));
        let file_name = format!("{base_name}.{}", source.extension());
        let dest = self.config.download_path.join(&file_name);

        let options = TransferOptions {
            expected_bytes: source.size.unwrap_or(0),
            stall_timeout: self.config.stall_timeout,
            retry: RetryPolicy::new(self.config.max_retries),
        };

        // The engine reports over a channel; the renderer consumes it in
        // its own task so transfers also run headless (tests, pipes)
        let (tx, rx) = mpsc::channel::<TransferEvent>(64);
        let renderer = ProgressRenderer::new(file_name.clone(), index);
        let render_task = tokio::spawn(progress::drive(renderer, rx));

        let result = self.engine.transfer(&url, &dest, &options, &tx).await;
        drop(tx);
        let _ = render_task.await;

        let transfer = result.context("download failed")?;

        self.check_duration(&dest, track).await;

        let lyrics_text = self.process_lyrics(track, &dest).await;
        self.apply_tags(track, &dest, lyrics_text).await;

        Ok(transfer.bytes_downloaded)
    }

    /// Advisory preview-clip check; never fails the item
    async fn check_duration(&self, dest: &Path, track: &TrackDetail) {
        let path = dest.to_path_buf();
        let probed = tokio::task::spawn_blocking(move || tags::probe_duration(&path)).await;

        match probed {
            Ok(Ok(duration)) if duration < MIN_PLAUSIBLE_DURATION => {
                let secs = duration.as_secs_f64();
                println!(
                    "{}",
                    format!(
                        "! warning: audio is only {secs:.1}s long, possibly a preview clip"
                    )
                    .yellow()
                );
                self.record_failure(
                    track,
                    &format!("suspiciously short audio ({secs:.1}s), possible preview-only clip"),
                );
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => println!("{}", format!("! could not check audio duration: {e:#}").yellow()),
            Err(e) => warn!("Duration probe task panicked: {e}"),
        }
    }

    /// Fetch, merge and emit lyrics per the configured mode
    ///
    /// Returns the merged LRC document when it should be embedded.
    async fn process_lyrics(&self, track: &TrackDetail, audio_path: &Path) -> Option<String> {
        if self.config.lyrics_mode == LyricsMode::None {
            return None;
        }

        let payload = match self.client.get_lyrics(track.id).await {
            Ok(payload) => payload,
            Err(e) => {
                println!(
                    "{}",
                    format!("! could not fetch lyrics for {}: {e:#}", track.name).yellow()
                );
                return None;
            }
        };

        let primary = payload
            .lrc
            .map(|block| parse_lrc(&block.lyric))
            .unwrap_or_default();
        if primary.is_empty() {
            println!(
                "{}",
                format!("! no usable lyrics for {}", track.name).yellow()
            );
            return None;
        }

        let translated = payload
            .translated
            .map(|block| parse_lrc(&block.lyric))
            .unwrap_or_default();
        let merged = merge_timelines(&primary, &translated, track.duration_secs());

        if matches!(self.config.lyrics_mode, LyricsMode::File | LyricsMode::Both) {
            let lrc_path = audio_path.with_extension("lrc");
            match write_lrc(&lrc_path, &merged).await {
                Ok(()) => println!(
                    "{}{}",
                    "✓ lyrics saved to ".green(),
                    lrc_path.display()
                ),
                Err(e) => println!("{}", format!("! could not write lyrics: {e:#}").yellow()),
            }
        }

        matches!(self.config.lyrics_mode, LyricsMode::Embed | LyricsMode::Both)
            .then(|| lrc_document(&merged))
    }

    /// Embed tags and cover art; failures warn but never fail the item
    async fn apply_tags(&self, track: &TrackDetail, dest: &Path, lyrics: Option<String>) {
        let cover = match track.album.as_ref().and_then(|a| a.pic_url.as_deref()) {
            Some(pic_url) => match self.client.get_cover_art(pic_url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Failed to fetch cover art for {}: {e:#}", track.name);
                    None
                }
            },
            None => None,
        };

        let track = track.clone();
        let path = dest.to_path_buf();
        let name = track.name.clone();

        // lofty does blocking file I/O
        let result = tokio::task::spawn_blocking(move || {
            tags::write_tags(&path, &track, lyrics.as_deref(), cover.as_deref())
        })
        .await;

        match result {
            Ok(Ok(())) => println!("{}{}", "✓ tagged ".green(), name),
            Ok(Err(e)) => println!("{}", format!("! could not write tags: {e:#}").yellow()),
            Err(e) => warn!("Tagging task panicked: {e}"),
        }
    }

    /// Save a `id - name - artist` listing next to the downloads
    async fn write_playlist_info(&self, playlist_id: u64, tracks: &[TrackDetail]) -> Result<()> {
        let path = self
            .config
            .download_path
            .join(format!("!#_playlist_{playlist_id}_info.txt"));

        let mut content = String::new();
        for track in tracks {
            content.push_str(&format!(
                "{} - {} - {}\n",
                track.id,
                track.name,
                track.artist_names()
            ));
        }

        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!("{}{}", "✓ playlist info saved to ".green(), path.display());
        Ok(())
    }

    fn record_failure(&self, track: &TrackDetail, reason: &str) {
        if let Err(e) = self
            .ledger
            .record(track.id, &track.name, &track.artist_names(), reason)
        {
            warn!("Failed to write ledger entry: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(dir: &Path) -> BatchConfig {
        BatchConfig::new(dir.to_path_buf(), Quality::Standard, LyricsMode::None)
    }

    #[tokio::test]
    async fn test_missing_source_recorded_and_batch_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/playlist/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "songs": [
                    {"id": 1, "name": "gone", "ar": [{"id": 1, "name": "A"}]},
                    {"id": 2, "name": "also gone", "ar": [{"id": 2, "name": "B"}]}
                ]
            })))
            .mount(&server)
            .await;
        // Sources resolve but carry no URL (delisted / no permissions)
        Mock::given(method("GET"))
            .and(path("/api/track/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": [{"id": 1, "url": null}]
            })))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let client = CatalogClient::new(&server.uri(), None).unwrap();
        let runner = BatchRunner::new(client, config(tmp.path())).unwrap();

        let summary = runner.run_playlist(5).await.unwrap();

        assert_eq!(summary.downloaded, 0);
        assert_eq!(summary.failed, 2, "both items processed despite failures");

        let ledger = std::fs::read_to_string(tmp.path().join(super::super::ledger::LEDGER_FILE_NAME))
            .unwrap();
        assert!(ledger.contains("ID: 1"));
        assert!(ledger.contains("ID: 2"));
        assert!(ledger.contains("no downloadable source"));
    }

    #[tokio::test]
    async fn test_http_error_produces_single_ledger_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/track/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "songs": [{"id": 9, "name": "dead link", "ar": [{"id": 1, "name": "A"}]}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/track/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "data": [{"id": 9, "url": format!("{}/cdn/9.mp3", server.uri()), "size": 100, "type": "mp3"}]
            })))
            .mount(&server)
            .await;
        let cdn_404 = Mock::given(method("GET"))
            .and(path("/cdn/9.mp3"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount_as_scoped(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let client = CatalogClient::new(&server.uri(), None).unwrap();
        let runner = BatchRunner::new(client, config(tmp.path())).unwrap();

        let summary = runner.run_track(9).await.unwrap();
        assert_eq!(summary.failed, 1);

        let ledger = std::fs::read_to_string(tmp.path().join(super::super::ledger::LEDGER_FILE_NAME))
            .unwrap();
        assert_eq!(
            ledger.matches("ID: 9").count(),
            1,
            "exactly one ledger entry for an HTTP failure"
        );
        assert!(ledger.contains("status 404"));
        drop(cdn_404);
    }

    #[tokio::test]
    async fn test_playlist_info_file_written() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/playlist/tracks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200,
                "songs": [{"id": 11, "name": "song", "ar": [{"id": 1, "name": "Artist"}]}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/track/url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 200, "data": [{"id": 11, "url": null}]
            })))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let client = CatalogClient::new(&server.uri(), None).unwrap();
        let runner = BatchRunner::new(client, config(tmp.path())).unwrap();
        runner.run_playlist(123).await.unwrap();

        let info =
            std::fs::read_to_string(tmp.path().join("!#_playlist_123_info.txt")).unwrap();
        assert_eq!(info, "11 - song - Artist\n");
    }
}
