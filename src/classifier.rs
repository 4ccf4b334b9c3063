//! Per-trial response classification.
//!
//! Runs once per trial after the rule engine has resolved correctness. Every
//! flag is a function of the current [`Evaluation`] (rule, previous rule,
//! correctness, run length before the trial) and the selected card, so no
//! trial log scan is needed and earlier records are never touched.
//!
//! | Flag | Condition |
//! |------|-----------|
//! | perseverative response | selection is the card correct under `prev_rule` |
//! | perseverative error | perseverative response ∧ ¬correct |
//! | non-perseverative error | ¬correct ∧ ¬perseverative response |
//! | conceptual response | correct ∧ run including this trial ≥ `conceptual_run` |
//! | set-maintenance error | ¬correct ∧ run before this trial ≥ `set_maintenance_run` |

use serde::{Deserialize, Serialize};

use crate::constants::{CONCEPTUAL_RUN, SET_MAINTENANCE_RUN};
use crate::rules::Evaluation;
use crate::stimulus::ReferenceDeck;
use crate::types::Card;

/// Run lengths the classifier keys off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringCriteria {
    pub conceptual_run: u32,
    pub set_maintenance_run: u32,
}

impl Default for ScoringCriteria {
    fn default() -> Self {
        Self {
            conceptual_run: CONCEPTUAL_RUN,
            set_maintenance_run: SET_MAINTENANCE_RUN,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub is_perseverative_response: bool,
    pub is_perseverative_error: bool,
    pub is_non_perseverative_error: bool,
    pub is_conceptual_response: bool,
    pub set_maintenance_error: bool,
}

/// Exported error label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorType {
    None,
    Perseverative,
    NonPerseverative,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::None => "",
            ErrorType::Perseverative => "perseverative",
            ErrorType::NonPerseverative => "non-perseverative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(ErrorType::None),
            "perseverative" => Some(ErrorType::Perseverative),
            "non-perseverative" => Some(ErrorType::NonPerseverative),
            _ => None,
        }
    }
}

impl Classification {
    pub fn error_type(&self) -> ErrorType {
        if self.is_perseverative_error {
            ErrorType::Perseverative
        } else if self.is_non_perseverative_error {
            ErrorType::NonPerseverative
        } else {
            ErrorType::None
        }
    }
}

pub fn classify(
    criteria: &ScoringCriteria,
    reference: &ReferenceDeck,
    stimulus: &Card,
    selected: usize,
    eval: &Evaluation,
) -> Classification {
    let is_perseverative_response = eval
        .prev_rule
        .is_some_and(|prev| reference.matching_index(stimulus, prev) == selected);

    let correct = eval.correct;
    let run_including = if correct { eval.run_before + 1 } else { 0 };

    Classification {
        is_perseverative_response,
        is_perseverative_error: is_perseverative_response && !correct,
        is_non_perseverative_error: !correct && !is_perseverative_response,
        is_conceptual_response: correct && run_including >= criteria.conceptual_run,
        set_maintenance_error: !correct && eval.run_before >= criteria.set_maintenance_run,
    }
}
