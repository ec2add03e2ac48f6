//! Bilingual lyric timeline merging

use std::collections::HashMap;

use super::parse::LyricLine;

/// Minimum gap, in seconds, between a lyric line and its inserted translation
pub const TRANSLATION_GAP: f64 = 0.01;

/// Merge a translated timeline into the primary timeline
///
/// A translation attaches only to a primary line sharing its exact
/// timestamp; unmatched or blank translations are dropped. Each attached
/// translation is inserted directly after its primary line at
/// `primary + TRANSLATION_GAP`, except:
///
/// - if that would land within `TRANSLATION_GAP` of the next primary line,
///   the translation collapses to `max(primary, next - TRANSLATION_GAP)`;
/// - after the last primary line it sits at the later of
///   `primary + TRANSLATION_GAP` and the tail position
///   (`song_duration + 0.5` when the duration is known, else `primary + 0.5`).
///
/// The result is re-sorted ascending as a safeguard.
pub fn merge_timelines(
    primary: &[LyricLine],
    translated: &[LyricLine],
    song_duration: Option<f64>,
) -> Vec<LyricLine> {
    if translated.is_empty() {
        return primary.to_vec();
    }

    // Keyed by exact timestamp bits; the API serves both blocks from the
    // same timing grid, so bit-identical timestamps are the match contract.
    let translations: HashMap<u64, &str> = translated
        .iter()
        .map(|l| (l.time.to_bits(), l.text.as_str()))
        .collect();

    let mut merged = Vec::with_capacity(primary.len() + translated.len());
    for (i, line) in primary.iter().enumerate() {
        merged.push(line.clone());

        let Some(text) = translations.get(&line.time.to_bits()) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }

        let mut time = line.time + TRANSLATION_GAP;
        if let Some(next) = primary.get(i + 1) {
            let latest_before_next = next.time - TRANSLATION_GAP;
            if time > latest_before_next {
                time = line.time.max(latest_before_next);
            }
        } else {
            let tail = song_duration.map_or(line.time + 0.5, |d| d + 0.5);
            time = time.max(tail);
        }
        merged.push(LyricLine::new(time, *text));
    }

    merged.sort_by(|a, b| a.time.total_cmp(&b.time));
    merged
}
