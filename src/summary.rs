//! Session aggregation: reduce a trial log into summary statistics.
//!
//! Pure function of the log, recomputable at any time. Partial logs (a
//! withdrawn participant) and the empty log are ordinary inputs: every
//! statistic degrades to 0 rather than failing.

use serde::{Deserialize, Serialize};

use crate::session::TrialRecord;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_trials: u32,
    pub total_correct: u32,
    pub total_errors: u32,
    pub categories_completed: u32,
    pub perseverative_responses: u32,
    pub perseverative_errors: u32,
    pub non_perseverative_errors: u32,
    pub conceptual_level_responses: u32,
    pub failure_to_maintain_set: u32,
    /// 1-based trial on which the first category completed; 0 if never.
    pub trials_to_complete_first_category: u32,
    /// Trial count per completed category, in completion order.
    pub trials_per_category: Vec<u32>,
    /// (mean first half − mean second half) / mean first half of `trials_per_category`.
    pub learning_to_learn: f64,
    /// Mean gap in trials between consecutive shift trials.
    pub shift_efficiency_mean: f64,
    pub mean_rt: f64,
    pub mean_rt_correct: f64,
    pub mean_rt_error: f64,
    pub percent_errors: f64,
    pub percent_perseverative_errors: f64,
    pub percent_conceptual_level_responses: f64,
}

/// Running sum/count pair for means that are 0 on an empty subset.
#[derive(Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, x: f64) {
        self.sum += x;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

fn percent(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

fn mean_of(xs: &[u32]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().map(|&x| x as f64).sum::<f64>() / xs.len() as f64
    }
}

/// Relative drop in trials-per-category from the first half of completed
/// categories to the second. With an odd count the middle category goes to
/// the second half. 0 unless the first half is non-empty.
pub fn learning_to_learn(trials_per_category: &[u32]) -> f64 {
    let half = trials_per_category.len() / 2;
    let mean_first = mean_of(&trials_per_category[..half]);
    let mean_second = mean_of(&trials_per_category[half..]);
    if mean_first > 0.0 {
        (mean_first - mean_second) / mean_first
    } else {
        0.0
    }
}

pub fn compute_summary(log: &[TrialRecord]) -> SessionSummary {
    let Some(last) = log.last() else {
        return SessionSummary::default();
    };

    let total_trials = log.len() as u32;
    let categories_completed = last.categories_completed;

    let mut s = SessionSummary {
        total_trials,
        categories_completed,
        ..Default::default()
    };

    let mut per_category = vec![0u32; categories_completed as usize];
    let mut first_category_trial: Option<u32> = None;
    let mut last_shift: Option<u32> = None;
    let mut shift_gaps = Mean::default();
    let mut rt_all = Mean::default();
    let mut rt_correct = Mean::default();
    let mut rt_error = Mean::default();

    for (i, rec) in log.iter().enumerate() {
        if rec.correct {
            s.total_correct += 1;
            rt_correct.add(rec.response_time_ms);
        } else {
            rt_error.add(rec.response_time_ms);
        }
        rt_all.add(rec.response_time_ms);

        s.perseverative_responses += rec.is_perseverative_response as u32;
        s.perseverative_errors += rec.is_perseverative_error as u32;
        s.non_perseverative_errors += rec.is_non_perseverative_error as u32;
        s.conceptual_level_responses += rec.is_conceptual_response as u32;
        s.failure_to_maintain_set += rec.set_maintenance_error as u32;

        if first_category_trial.is_none() && rec.categories_completed == 1 {
            first_category_trial = Some(i as u32 + 1);
        }
        if let Some(slot) = per_category.get_mut(rec.category_index as usize) {
            *slot += 1;
        }
        if rec.is_shift_trial {
            if let Some(prev) = last_shift {
                shift_gaps.add(rec.trial_index.saturating_sub(prev) as f64);
            }
            last_shift = Some(rec.trial_index);
        }
    }

    s.total_errors = total_trials - s.total_correct;
    s.trials_to_complete_first_category = first_category_trial.unwrap_or(0);
    s.learning_to_learn = learning_to_learn(&per_category);
    s.trials_per_category = per_category;
    s.shift_efficiency_mean = shift_gaps.value();
    s.mean_rt = rt_all.value();
    s.mean_rt_correct = rt_correct.value();
    s.mean_rt_error = rt_error.value();
    s.percent_errors = percent(s.total_errors, total_trials);
    s.percent_perseverative_errors = percent(s.perseverative_errors, total_trials);
    s.percent_conceptual_level_responses = percent(s.conceptual_level_responses, total_trials);
    s
}
