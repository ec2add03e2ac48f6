//! Terminal rendering: display-width math and the live progress line

pub mod progress;
pub mod width;

pub use progress::ProgressRenderer;
pub use width::{display_width, truncate_to_width};
