//! Statistics aggregation over a batch of session summaries.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::summary::SessionSummary;

// ── Top-level statistics ────────────────────────────────────────────

#[derive(Serialize)]
pub struct BatchStatistics {
    pub participant_model: String,
    pub num_sessions: u64,
    pub seed: u64,
    /// Share of sessions that completed at least one category.
    pub first_category_rate: f64,
    pub metrics: BTreeMap<String, MetricStatistics>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStatistics {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

type Extractor = fn(&SessionSummary) -> f64;

const METRICS: [(&str, Extractor); 11] = [
    ("total_trials", |s| s.total_trials as f64),
    ("categories_completed", |s| s.categories_completed as f64),
    ("total_errors", |s| s.total_errors as f64),
    ("perseverative_errors", |s| s.perseverative_errors as f64),
    ("non_perseverative_errors", |s| s.non_perseverative_errors as f64),
    ("conceptual_level_responses", |s| s.conceptual_level_responses as f64),
    ("failure_to_maintain_set", |s| s.failure_to_maintain_set as f64),
    ("trials_to_complete_first_category", |s| {
        s.trials_to_complete_first_category as f64
    }),
    ("learning_to_learn", |s| s.learning_to_learn),
    ("shift_efficiency_mean", |s| s.shift_efficiency_mean),
    ("mean_rt", |s| s.mean_rt),
];

// ── Aggregation ─────────────────────────────────────────────────────

pub fn aggregate_batch(summaries: &[SessionSummary], participant_model: &str, seed: u64) -> BatchStatistics {
    let metrics = METRICS
        .iter()
        .map(|(name, extract)| {
            let values: Vec<f64> = summaries.iter().map(extract).collect();
            (name.to_string(), MetricStatistics::from_values(&values))
        })
        .collect();

    let reached_first = summaries
        .iter()
        .filter(|s| s.trials_to_complete_first_category > 0)
        .count();
    let first_category_rate = if summaries.is_empty() {
        0.0
    } else {
        reached_first as f64 / summaries.len() as f64
    };

    BatchStatistics {
        participant_model: participant_model.to_string(),
        num_sessions: summaries.len() as u64,
        seed,
        first_category_rate,
        metrics,
    }
}

pub fn save_statistics(stats: &BatchStatistics, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json)?;
    Ok(())
}
