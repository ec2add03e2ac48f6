//! Utility functions

pub mod paths;
mod sanitize;

pub use paths::prepare_download_dir;
pub use sanitize::sanitize_filename;
