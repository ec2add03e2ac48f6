//! Catalog API response models

use serde::Deserialize;

/// Audio quality level, passed through to the catalog as-is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Quality {
    Standard,
    Higher,
    Exhigh,
    #[default]
    Lossless,
    Hires,
}

impl Quality {
    /// Wire value of the `level` request parameter
    pub fn as_level(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::Higher => "higher",
            Quality::Exhigh => "exhigh",
            Quality::Lossless => "lossless",
            Quality::Hires => "hires",
        }
    }
}

/// Track artist
#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub id: u64,
    pub name: String,
}

/// Album reference embedded in a track detail
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "picUrl")]
    pub pic_url: Option<String>,
}

/// Full track metadata from the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct TrackDetail {
    pub id: u64,
    pub name: String,
    #[serde(default, rename = "ar")]
    pub artists: Vec<Artist>,
    #[serde(rename = "al")]
    pub album: Option<AlbumRef>,
    /// Duration in milliseconds
    #[serde(default, rename = "dt")]
    pub duration_ms: u64,
    #[serde(default, rename = "no")]
    pub track_number: u32,
    /// Release time as a millisecond epoch, 0 when unknown
    #[serde(default, rename = "publishTime")]
    pub publish_time_ms: i64,
}

impl TrackDetail {
    /// All artist names joined for display and tagging
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn duration_secs(&self) -> Option<f64> {
        (self.duration_ms > 0).then(|| self.duration_ms as f64 / 1000.0)
    }

    /// Release year derived from the publish timestamp
    pub fn release_year(&self) -> Option<String> {
        if self.publish_time_ms <= 0 {
            return None;
        }
        chrono::DateTime::from_timestamp_millis(self.publish_time_ms)
            .map(|dt| dt.format("%Y").to_string())
    }
}

/// Resolved download source for one track
#[derive(Debug, Clone, Deserialize)]
pub struct AudioSource {
    pub id: u64,
    /// Absent when the track is unavailable at the requested quality
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    /// Container format reported by the catalog (`mp3`, `flac`, ...)
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
}

impl AudioSource {
    /// File extension for the destination name
    pub fn extension(&self) -> String {
        self.file_type
            .as_deref()
            .unwrap_or("mp3")
            .to_lowercase()
    }
}

/// One lyric block (original or translated) as raw LRC text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LyricBlock {
    #[serde(default)]
    pub lyric: String,
}

// Response envelopes; every catalog response carries a `code` field that
// is 200 on success even when the HTTP status is 200.

#[derive(Debug, Deserialize)]
pub struct AudioSourceResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Vec<AudioSource>,
}

#[derive(Debug, Deserialize)]
pub struct TracksResponse {
    pub code: i64,
    #[serde(default)]
    pub songs: Vec<TrackDetail>,
}

#[derive(Debug, Deserialize)]
pub struct LyricsResponse {
    pub code: i64,
    pub lrc: Option<LyricBlock>,
    #[serde(rename = "tlyric")]
    pub translated: Option<LyricBlock>,
}
