//! Re-score an exported trial table and print the session summary as JSON.
//!
//! Usage: `wcst-score session.csv [--config wcst.json]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use wcst::config::SessionConfig;
use wcst::env_config::{init_logging, session_config};
use wcst::export::read_csv;
use wcst::summary::compute_summary;

#[derive(Parser)]
#[command(name = "wcst-score", about = "Summarize an exported WCST trial log")]
struct Args {
    /// Exported CSV trial log
    input: PathBuf,

    /// Session config the log was recorded under (default: $WCST_CONFIG or built-in)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => session_config().context("loading session config")?,
    };
    let rows = read_csv(&args.input, &config)
        .with_context(|| format!("reading {}", args.input.display()))?;
    tracing::info!(rows = rows.len(), "trial log loaded");

    let summary = compute_summary(&rows);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
