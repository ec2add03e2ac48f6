//! Timed-lyric (LRC) parsing

/// A single timestamped lyric line
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Offset from the start of the song, in seconds
    pub time: f64,
    pub text: String,
}

impl LyricLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// Parse LRC content into a timeline sorted ascending by timestamp
///
/// Recognized lines start with a `[MM:SS.ff]` or `[MM:SS.fff]` tag; the
/// fractional field is right-padded to milliseconds. Lines without a
/// leading timestamp tag (headers, credits, blank lines) are dropped.
/// The sort is stable, so lines sharing a timestamp keep source order.
pub fn parse_lrc(content: &str) -> Vec<LyricLine> {
    let mut lines: Vec<LyricLine> = content
        .lines()
        .filter_map(|line| {
            let (time, text) = parse_tagged_line(line)?;
            Some(LyricLine::new(time, text))
        })
        .collect();
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

/// Split a `[MM:SS.ff(f)]text` line into (seconds, text)
fn parse_tagged_line(line: &str) -> Option<(f64, &str)> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    let (stamp, text) = (&rest[..end], &rest[end + 1..]);

    let (minutes, stamp) = stamp.split_once(':')?;
    let (seconds, fraction) = stamp.split_once('.')?;
    if minutes.len() != 2 || seconds.len() != 2 || !(2..=3).contains(&fraction.len()) {
        return None;
    }
    if ![minutes, seconds, fraction]
        .iter()
        .all(|s| s.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    // 2-digit fractions are centiseconds; pad right to milliseconds
    let millis: u32 = format!("{fraction:0<3}").parse().ok()?;

    let time = f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(millis) / 1000.0;
    Some((time, text))
}
