//! Audio metadata: text tags, cover art embedding and duration probing

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::TrackDetail;

/// Maximum dimension for embedded cover art (width or height)
const MAX_COVER_SIZE: u32 = 500;

/// Initial JPEG quality (0-100)
const JPEG_QUALITY: u8 = 85;

/// Maximum embedded cover size in bytes (500KB)
const MAX_COVER_BYTES: usize = 500 * 1024;

/// Process cover art for embedding
///
/// - Decodes the image
/// - Resizes to fit within MAX_COVER_SIZE
/// - Encodes as baseline JPEG
/// - Reduces quality if the result exceeds MAX_COVER_BYTES
pub fn process_cover_art(data: &[u8]) -> Result<Vec<u8>> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("Failed to guess image format")?
        .decode()
        .context("Failed to decode cover art")?;

    let img = resize_to_fit(img);

    let mut quality = JPEG_QUALITY;
    loop {
        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
        encoder
            .encode_image(&img)
            .context("Failed to encode cover art as JPEG")?;

        if output.len() <= MAX_COVER_BYTES || quality <= 50 {
            debug!(
                "Processed cover art: {}x{} -> {} bytes (quality {})",
                img.width(),
                img.height(),
                output.len(),
                quality
            );
            return Ok(output);
        }

        warn!(
            "Cover art too large ({} bytes), reducing quality from {} to {}",
            output.len(),
            quality,
            quality - 10
        );
        quality -= 10;
    }
}

/// Resize image to fit within MAX_COVER_SIZE while maintaining aspect ratio
fn resize_to_fit(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());

    if width <= MAX_COVER_SIZE && height <= MAX_COVER_SIZE {
        return img;
    }

    let (new_width, new_height) = if width > height {
        let ratio = MAX_COVER_SIZE as f64 / width as f64;
        (MAX_COVER_SIZE, (height as f64 * ratio) as u32)
    } else {
        let ratio = MAX_COVER_SIZE as f64 / height as f64;
        ((width as f64 * ratio) as u32, MAX_COVER_SIZE)
    };

    debug!(
        "Resizing cover art: {}x{} -> {}x{}",
        width, height, new_width, new_height
    );

    img.resize(new_width, new_height, FilterType::Lanczos3)
}

/// Write track metadata into an audio file
///
/// Sets title, artist, album, track number and release year from the
/// catalog detail, plus merged lyrics and cover art when available.
/// Supports MP3, FLAC, OGG, M4A and other formats via lofty.
pub fn write_tags(
    path: &Path,
    track: &TrackDetail,
    lyrics: Option<&str>,
    cover: Option<&[u8]>,
) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .context("Failed to open audio file")?
        .read()
        .context("Failed to read audio file tags")?;

    // Get the primary tag, or create one matching the container
    let tag = match tagged_file.primary_tag_mut() {
        Some(tag) => tag,
        None => {
            if let Some(tag) = tagged_file.first_tag_mut() {
                tag
            } else {
                let tag_type = tagged_file.primary_tag_type();
                tagged_file.insert_tag(lofty::tag::Tag::new(tag_type));
                tagged_file
                    .primary_tag_mut()
                    .context("Failed to create tag")?
            }
        }
    };

    tag.set_title(track.name.clone());
    tag.set_artist(track.artist_names());
    if let Some(album) = &track.album {
        tag.set_album(album.name.clone());
    }
    if track.track_number > 0 {
        tag.set_track(track.track_number);
    }
    if let Some(year) = track.release_year().and_then(|y| y.parse::<u32>().ok()) {
        tag.set_year(year);
    }
    if let Some(lyrics) = lyrics {
        tag.insert_text(lofty::tag::ItemKey::Lyrics, lyrics.to_string());
    }

    if let Some(cover) = cover {
        let processed = process_cover_art(cover)?;
        let picture = Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Jpeg),
            None,
            processed,
        );
        tag.remove_picture_type(PictureType::CoverFront);
        tag.push_picture(picture);
    }

    tagged_file
        .save_to_path(path, WriteOptions::default())
        .context("Failed to save audio file with tags")?;

    debug!("Wrote tags: {}", path.display());
    Ok(())
}

/// Decodable audio duration of the written file
///
/// Used for the preview-clip advisory; failures here never fail the item.
pub fn probe_duration(path: &Path) -> Result<Duration> {
    let tagged_file = Probe::open(path)
        .context("Failed to open audio file")?
        .read()
        .context("Failed to read audio properties")?;

    Ok(tagged_file.properties().duration())
}
