//! Catalog API HTTP client

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::models::*;

/// HTTP client for the cloud-music catalog API
///
/// Login is out of scope here: the session token (when present) is an
/// opaque cookie value obtained elsewhere and passed through on every
/// request.
#[derive(Clone)]
pub struct CatalogClient {
    base_url: String,
    session: Option<String>,
    http: Client,
}

impl CatalogClient {
    /// Create a new catalog client
    pub fn new(base_url: &str, session: Option<&str>) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).context("Invalid catalog API base URL")?;

        let http = Client::builder()
            .user_agent("cadenza/0.1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            session: session.map(str::to_string),
            http,
        })
    }

    /// Build a request URL with encoded query parameters
    fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let query: String = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/{}?{}", self.base_url, endpoint, query)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(session) = &self.session {
            request = request.header(reqwest::header::COOKIE, format!("MUSIC_U={session}"));
        }
        request
    }

    /// Resolve the download source for a track at the given quality
    pub async fn get_audio_source(&self, track_id: u64, quality: Quality) -> Result<AudioSource> {
        let url = self.build_url(
            "api/track/url",
            &[
                ("id", track_id.to_string()),
                ("level", quality.as_level().to_string()),
            ],
        );
        debug!("Resolving audio source: {url}");

        let response: AudioSourceResponse = self
            .get(&url)
            .send()
            .await
            .context("Failed to resolve audio source")?
            .json()
            .await
            .context("Failed to parse audio source response")?;

        self.check_code(response.code, "resolving audio source")?;

        response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Audio source response contained no entries"))
    }

    /// Fetch full metadata for a track
    pub async fn get_track_detail(&self, track_id: u64) -> Result<TrackDetail> {
        let url = self.build_url("api/track/detail", &[("id", track_id.to_string())]);
        debug!("Fetching track detail: {url}");

        let response: TracksResponse = self
            .get(&url)
            .send()
            .await
            .context("Failed to fetch track detail")?
            .json()
            .await
            .context("Failed to parse track detail response")?;

        self.check_code(response.code, "fetching track detail")?;

        response
            .songs
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Track {track_id} not found"))
    }

    /// Fetch the original and translated lyric blocks for a track
    pub async fn get_lyrics(&self, track_id: u64) -> Result<LyricsResponse> {
        let url = self.build_url("api/track/lyrics", &[("id", track_id.to_string())]);
        debug!("Fetching lyrics: {url}");

        let response: LyricsResponse = self
            .get(&url)
            .send()
            .await
            .context("Failed to fetch lyrics")?
            .json()
            .await
            .context("Failed to parse lyrics response")?;

        self.check_code(response.code, "fetching lyrics")?;
        Ok(response)
    }

    /// Fetch every track of a playlist
    pub async fn get_playlist_tracks(&self, playlist_id: u64) -> Result<Vec<TrackDetail>> {
        let url = self.build_url("api/playlist/tracks", &[("id", playlist_id.to_string())]);
        debug!("Fetching playlist tracks: {url}");

        let response: TracksResponse = self
            .get(&url)
            .send()
            .await
            .context("Failed to fetch playlist")?
            .json()
            .await
            .context("Failed to parse playlist response")?;

        self.check_code(response.code, "fetching playlist")?;

        debug!("Playlist {playlist_id} has {} tracks", response.songs.len());
        Ok(response.songs)
    }

    /// Download cover art as bytes
    pub async fn get_cover_art(&self, pic_url: &str) -> Result<bytes::Bytes> {
        debug!("Fetching cover art: {pic_url}");

        let response = self
            .get(pic_url)
            .send()
            .await
            .context("Failed to fetch cover art")?;

        if !response.status().is_success() {
            anyhow::bail!("Cover art not found (status {})", response.status());
        }

        response
            .bytes()
            .await
            .context("Failed to read cover art response")
    }

    /// Fail on an API-level error code
    fn check_code(&self, code: i64, what: &str) -> Result<()> {
        if code != 200 {
            anyhow::bail!("Catalog error {code} while {what}");
        }
        Ok(())
    }
}
