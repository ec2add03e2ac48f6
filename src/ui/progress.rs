//! Terminal progress rendering for live transfers
//!
//! One overwritten line with an inverted-style fill when the terminal is
//! wide enough; a single static header line otherwise. The renderer only
//! consumes [`TransferEvent`]s, so transfers run identically headless.

use colored::Colorize;
use console::{style, Term};
use std::io::Write as _;
use std::time::Duration;
use tokio::sync::mpsc;

use super::width::{display_width, split_at_cells, truncate_to_width};
use crate::transfer::{ProgressTick, TransferEvent};

/// Narrower terminals always get the static-header fallback
const MIN_SINGLE_LINE_WIDTH: usize = 60;

/// Renders the progress of one transfer
pub struct ProgressRenderer {
    term: Term,
    file_name: String,
    index_prefix: String,
    single_line: bool,
    single_line_used: bool,
    header_printed: bool,
}

impl ProgressRenderer {
    /// `index` is the `(position, total)` of this item within the batch
    pub fn new(file_name: impl Into<String>, index: Option<(usize, usize)>) -> Self {
        let term = Term::stdout();
        let index_prefix = index_prefix(index);
        let single_line = term.is_term() && fits_single_line(terminal_width(&term), &index_prefix);
        Self {
            term,
            file_name: file_name.into(),
            index_prefix,
            single_line,
            single_line_used: false,
            header_printed: false,
        }
    }

    pub fn handle(&mut self, event: &TransferEvent) {
        match event {
            TransferEvent::Started { .. } => {}
            TransferEvent::Progress(tick) => self.render_tick(tick),
            TransferEvent::AttemptFailed { reason, .. } => self.attempt_failed(reason),
            TransferEvent::Completed { .. } => self.finish(),
        }
    }

    fn render_tick(&mut self, tick: &ProgressTick) {
        if !self.single_line {
            self.print_header_once();
            return;
        }

        // The user may have resized mid-transfer; downgrade for the rest
        // of this transfer when the full line no longer fits
        let term_w = terminal_width(&self.term);
        if !fits_single_line(term_w, &self.index_prefix) {
            self.single_line = false;
            self.print_header_once();
            return;
        }
        self.single_line_used = true;

        let right = format!(
            "{} {} {}",
            size_field(tick.bytes_downloaded, tick.bytes_total),
            speed_field(tick.throughput),
            eta_field(tick.eta),
        );
        let left_prefix = format!("{}downloading:", self.index_prefix);
        let percent_part = format!(" {}", percent_field(tick.fraction()));

        let right_w = display_width(&right);
        let static_w = display_width(&left_prefix) + display_width(&percent_part);
        let max_name_w = term_w.saturating_sub(right_w + static_w + 1);
        if max_name_w <= 5 {
            self.single_line = false;
            self.print_header_once();
            return;
        }

        let name = truncate_to_width(&self.file_name, max_name_w);
        let left = format!("{left_prefix}{name}{percent_part}");
        let spaces = term_w
            .saturating_sub(display_width(&left) + right_w)
            .max(1);
        let line = format!("{left}{}{right}", " ".repeat(spaces));

        let fill = ((term_w as f64) * tick.fraction().unwrap_or(0.0)) as usize;
        let (head, tail) = split_at_cells(&line, fill.min(term_w));
        let pad = " ".repeat(term_w.saturating_sub(display_width(&line)));

        let _ = self.term.write_str(&format!(
            "\r{}{}{pad}",
            style(head).yellow().reverse(),
            style(tail).yellow(),
        ));
        let _ = self.term.flush();
    }

    fn print_header_once(&mut self) {
        if self.header_printed {
            return;
        }
        self.header_printed = true;

        let term_w = terminal_width(&self.term);
        let prefix = format!("{}downloading: ", self.index_prefix);
        let max_name_w = term_w.saturating_sub(display_width(&prefix) + 1);
        let name = truncate_to_width(&self.file_name, max_name_w);
        println!("{}", format!("{prefix}{name}").bright_blue());
    }

    fn attempt_failed(&mut self, reason: &str) {
        if self.single_line_used {
            let _ = self.term.write_str("\n");
        }
        println!("{}", format!("! {reason}, retrying...").yellow());
    }

    fn finish(&mut self) {
        if self.single_line_used {
            let _ = self.term.clear_line();
        }
        println!(
            "{}{}",
            format!("✓ downloaded {}", self.index_prefix).green(),
            self.file_name
        );
    }
}

/// Drain a transfer's event channel into the renderer
pub async fn drive(mut renderer: ProgressRenderer, mut rx: mpsc::Receiver<TransferEvent>) {
    while let Some(event) = rx.recv().await {
        renderer.handle(&event);
    }
}

fn terminal_width(term: &Term) -> usize {
    let (_, cols) = term.size();
    cols as usize
}

fn index_prefix(index: Option<(usize, usize)>) -> String {
    match index {
        Some((i, total)) => {
            let digits = total.to_string().len();
            format!("[{i:0digits$}/{total}] ")
        }
        None => String::new(),
    }
}

/// Fully-populated status line used for the mode decision
fn worst_case_status_line(index_prefix: &str) -> String {
    format!("{index_prefix}downloading:... 100.0%  99.99MB/99.99MB 99999KB/s 9999s")
}

fn fits_single_line(term_w: usize, index_prefix: &str) -> bool {
    term_w >= MIN_SINGLE_LINE_WIDTH
        && display_width(&worst_case_status_line(index_prefix)) <= term_w.saturating_sub(2)
}

/// Percentage centered in a six-cell field, `---%` when the total is unknown
fn percent_field(fraction: Option<f64>) -> String {
    let raw = match fraction {
        Some(f) => {
            let pct = f * 100.0;
            let s = format!("{pct:.1}%");
            if pct < 10.0 {
                s.trim_start_matches('0').to_string()
            } else {
                s
            }
        }
        None => "---%".to_string(),
    };

    let w = raw.len();
    if w >= 6 {
        raw[..6].to_string()
    } else {
        let left = (6 - w) / 2;
        let right = 6 - w - left;
        format!("{}{raw}{}", " ".repeat(left), " ".repeat(right))
    }
}

fn size_field(downloaded: u64, total: u64) -> String {
    let d = downloaded as f64 / 1024.0 / 1024.0;
    if total > 0 {
        format!("{d:.2}MB/{:.2}MB", total as f64 / 1024.0 / 1024.0)
    } else {
        format!("{d:.2}MB/??MB")
    }
}

fn speed_field(bytes_per_sec: f64) -> String {
    let kb = bytes_per_sec / 1024.0;
    if kb <= 0.0 {
        "0KB/s".to_string()
    } else if kb >= 100.0 {
        format!("{kb:.0}KB/s")
    } else {
        format!("{kb:.1}KB/s")
    }
}

fn eta_field(eta: Option<Duration>) -> String {
    let Some(eta) = eta else {
        return "--".to_string();
    };
    let secs = eta.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_prefix_zero_padded() {
        assert_eq!(index_prefix(Some((3, 120))), "[003/120] ");
        assert_eq!(index_prefix(Some((12, 12))), "[12/12] ");
        assert_eq!(index_prefix(None), "");
    }

    #[test]
    fn test_fits_requires_minimum_width() {
        assert!(!fits_single_line(59, ""));
        assert!(fits_single_line(120, ""));
    }

    #[test]
    fn test_fits_accounts_for_index_prefix() {
        // A wide prefix can push the worst-case line past a narrow terminal
        let prefix = index_prefix(Some((1, 10_000)));
        assert!(fits_single_line(80, ""));
        assert!(!fits_single_line(60, &prefix));
    }

    #[test]
    fn test_percent_field_centering() {
        assert_eq!(percent_field(Some(1.0)), "100.0%");
        assert_eq!(percent_field(Some(0.5)), "50.0% ");
        assert_eq!(percent_field(None), " ---% ");
    }

    #[test]
    fn test_percent_field_strips_leading_zero_below_ten() {
        assert_eq!(percent_field(Some(0.053)), " 5.3% ");
        assert_eq!(percent_field(Some(0.005)), " .5%  ");
    }

    #[test]
    fn test_size_field() {
        assert_eq!(size_field(1_048_576, 2_097_152), "1.00MB/2.00MB");
        assert_eq!(size_field(524_288, 0), "0.50MB/??MB");
    }

    #[test]
    fn test_speed_field_precision() {
        assert_eq!(speed_field(0.0), "0KB/s");
        assert_eq!(speed_field(50.0 * 1024.0), "50.0KB/s");
        assert_eq!(speed_field(250.0 * 1024.0), "250KB/s");
    }

    #[test]
    fn test_eta_field_ranges() {
        assert_eq!(eta_field(None), "--");
        assert_eq!(eta_field(Some(Duration::from_secs(45))), "45s");
        assert_eq!(eta_field(Some(Duration::from_secs(125))), "2m05s");
        assert_eq!(eta_field(Some(Duration::from_secs(3_700))), "1h01m");
    }
}
