//! Run batches of simulated WCST sessions and write batch statistics.
//!
//! Usage: `wcst-simulate --participants 1000 --seed 42 --strategy wsls:0.05`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use wcst::env_config::{init_logging, init_rayon_threads, output_dir, session_config};
use wcst::export::write_csv;
use wcst::simulation::{aggregate_batch, save_statistics, simulate_batch, simulate_session, ParticipantSpec};

#[derive(Parser)]
#[command(name = "wcst-simulate", about = "Simulate WCST sessions with synthetic participants")]
struct Args {
    /// Number of simulated participants
    #[arg(long, default_value_t = 1000)]
    participants: usize,

    /// Base seed; participant i uses seed + i
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Participant model: ideal, wsls, perseverator, random (optional ":<lapse>")
    #[arg(long, default_value = "wsls")]
    strategy: String,

    /// Output directory (default: $WCST_OUTPUT_DIR or "data")
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also export the trial log of the first participant as CSV
    #[arg(long)]
    sample_log: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let spec = ParticipantSpec::from_spec(&args.strategy)
        .with_context(|| format!("bad --strategy {:?}", args.strategy))?;
    let config = session_config().context("loading session config")?;
    let out_dir = args.output.unwrap_or_else(output_dir);
    init_rayon_threads();

    info!(
        participants = args.participants,
        seed = args.seed,
        strategy = %spec.name(),
        "simulating"
    );
    let result = simulate_batch(spec, &config, args.participants, args.seed)?;
    info!(elapsed = ?result.elapsed, "simulation finished");

    let stats = aggregate_batch(&result.summaries, &spec.name(), args.seed);
    for (name, m) in &stats.metrics {
        println!(
            "{:<36} mean {:>9.3}  sd {:>8.3}  min {:>8.2}  max {:>8.2}",
            name, m.mean, m.std_dev, m.min, m.max
        );
    }
    println!("{:<36} {:.3}", "first_category_rate", stats.first_category_rate);

    let stats_path = out_dir.join("wcst_statistics.json");
    save_statistics(&stats, &stats_path)
        .with_context(|| format!("writing {}", stats_path.display()))?;
    info!(path = %stats_path.display(), "statistics written");

    if args.sample_log && args.participants > 0 {
        let session = simulate_session(spec, &config, args.seed, "SIM00000")?;
        let log_path = out_dir.join("wcst_sample_log.csv");
        write_csv(&log_path, session.log(), &config.domain)
            .with_context(|| format!("writing {}", log_path.display()))?;
    }
    Ok(())
}
