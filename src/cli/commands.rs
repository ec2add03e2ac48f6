//! CLI command handlers

use anyhow::Result;
use clap_complete::generate;
use colored::Colorize;
use std::io;

use super::DownloadArgs;
use crate::api::CatalogClient;
use crate::batch::{BatchConfig, BatchRunner, BatchSummary};
use crate::utils::prepare_download_dir;

/// Handle the `playlist` command
pub async fn playlist(id: u64, args: DownloadArgs) -> Result<()> {
    let runner = build_runner(&args)?;

    println!("{}", format!("Downloading playlist {id}...").cyan());
    let summary = runner.run_playlist(id).await?;

    print_summary(&summary);
    Ok(())
}

/// Handle the `track` command
pub async fn track(id: u64, args: DownloadArgs) -> Result<()> {
    let runner = build_runner(&args)?;

    let summary = runner.run_track(id).await?;

    print_summary(&summary);
    Ok(())
}

fn build_runner(args: &DownloadArgs) -> Result<BatchRunner> {
    let download_path = prepare_download_dir(&args.output)?;
    let client = CatalogClient::new(&args.api_url, args.session.as_deref())?;

    let mut config = BatchConfig::new(download_path, args.quality, args.lyrics);
    config.max_retries = args.retries;

    BatchRunner::new(client, config)
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", "Done!".green().bold());
    println!("  Tracks downloaded: {}", summary.downloaded);
    println!(
        "  Total size: {:.1} MB",
        summary.bytes_downloaded as f64 / 1_048_576.0
    );
    if summary.failed > 0 {
        println!(
            "  {}",
            format!(
                "Failed: {} (see {})",
                summary.failed,
                crate::batch::ledger::LEDGER_FILE_NAME
            )
            .yellow()
        );
    }
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = super::Cli::command();
    generate(shell, &mut cmd, "cadenza", &mut io::stdout());
}

// Extension trait for Cli to get clap Command
impl super::Cli {
    fn command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }
}
