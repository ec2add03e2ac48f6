//! CLI module for cadenza

use clap::{Args, Parser, Subcommand};

use crate::api::Quality;
use crate::batch::LyricsMode;

pub mod commands;

#[derive(Parser, Debug)]
#[command(name = "cadenza", about = "Download cloud-music playlists with tags and synced lyrics")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every track of a playlist
    Playlist {
        /// Playlist identifier
        id: u64,

        #[command(flatten)]
        args: DownloadArgs,
    },

    /// Download a single track
    Track {
        /// Track identifier
        id: u64,

        #[command(flatten)]
        args: DownloadArgs,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Catalog API base URL
    #[arg(long, env = "CADENZA_API_URL")]
    pub api_url: String,

    /// Session cookie value from a logged-in account (optional)
    #[arg(long, env = "CADENZA_SESSION")]
    pub session: Option<String>,

    /// Download directory
    #[arg(short, long, default_value = "downloads")]
    pub output: String,

    /// Audio quality level (passed through to the catalog)
    #[arg(short, long, value_enum, default_value = "lossless")]
    pub quality: Quality,

    /// Where merged lyrics go
    #[arg(long, value_enum, default_value = "both")]
    pub lyrics: LyricsMode,

    /// Retries per track after the first attempt
    #[arg(long, default_value_t = 2)]
    pub retries: u8,
}
