//! Lyric parsing, bilingual merging and LRC output

pub mod lrc;
pub mod merge;
pub mod parse;

pub use lrc::{format_lrc_line, lrc_document, write_lrc};
pub use merge::{merge_timelines, TRANSLATION_GAP};
pub use parse::{parse_lrc, LyricLine};
