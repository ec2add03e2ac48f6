//! cadenza - Download cloud-music playlists with tags and synced lyrics

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod batch;
mod cli;
mod lyrics;
mod tags;
mod transfer;
mod ui;
mod utils;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "cadenza=debug,reqwest=debug"
    } else {
        "cadenza=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Playlist { id, args } => {
            cli::commands::playlist(id, args).await?;
        }
        Commands::Track { id, args } => {
            cli::commands::track(id, args).await?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(shell);
        }
    }

    Ok(())
}
