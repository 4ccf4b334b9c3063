//! Shared environment configuration for the WCST binaries.
//!
//! Consolidates `WCST_CONFIG`, `WCST_MAX_TRIALS`, `WCST_MAX_CATEGORIES`,
//! `WCST_OUTPUT_DIR`, `RAYON_NUM_THREADS` and the logging filter.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::config::SessionConfig;
use crate::error::{Result, WcstError};

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Read `RAYON_NUM_THREADS` (fallback `OMP_NUM_THREADS`, default 8) and build
/// the global pool. Tolerates an already-initialized pool. Returns thread count.
pub fn init_rayon_threads() -> usize {
    let num_threads = std::env::var("RAYON_NUM_THREADS")
        .or_else(|_| std::env::var("OMP_NUM_THREADS"))
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    if rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .is_err()
    {
        tracing::debug!("rayon pool already initialized");
    }
    tracing::info!(threads = num_threads, "rayon pool ready");
    num_threads
}

/// Read `WCST_OUTPUT_DIR` (default `"data"`).
pub fn output_dir() -> PathBuf {
    PathBuf::from(std::env::var("WCST_OUTPUT_DIR").unwrap_or_else(|_| "data".to_string()))
}

fn env_u32(name: &str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| WcstError::InvalidConfig(format!("{}={:?} is not a count", name, v))),
        Err(_) => Ok(None),
    }
}

/// Session config from `WCST_CONFIG` (JSON path, optional) with
/// `WCST_MAX_TRIALS` / `WCST_MAX_CATEGORIES` overrides applied on top.
pub fn session_config() -> Result<SessionConfig> {
    let mut config = match std::env::var("WCST_CONFIG") {
        Ok(path) => SessionConfig::load(path)?,
        Err(_) => SessionConfig::default(),
    };
    if let Some(n) = env_u32("WCST_MAX_TRIALS")? {
        config.max_trials = n;
    }
    if let Some(n) = env_u32("WCST_MAX_CATEGORIES")? {
        config.max_categories = n;
    }
    config.validate()?;
    Ok(config)
}
