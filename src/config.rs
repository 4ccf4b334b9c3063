//! Per-session administration parameters.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```json
//! { "max_trials": 64, "switch_policy": "random" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classifier::ScoringCriteria;
use crate::constants::*;
use crate::error::{Result, WcstError};
use crate::rules::{RuleOrder, SwitchPolicy};
use crate::stimulus::{ReferenceDeck, StimulusDomain};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub category_threshold: u32,
    pub conceptual_run: u32,
    pub set_maintenance_run: u32,
    pub max_trials: u32,
    pub max_categories: u32,
    pub rule_order: RuleOrder,
    pub switch_policy: SwitchPolicy,
    pub domain: StimulusDomain,
    pub reference_deck: ReferenceDeck,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            category_threshold: CATEGORY_THRESHOLD,
            conceptual_run: CONCEPTUAL_RUN,
            set_maintenance_run: SET_MAINTENANCE_RUN,
            max_trials: DEFAULT_MAX_TRIALS,
            max_categories: DEFAULT_MAX_CATEGORIES,
            rule_order: RuleOrder::default(),
            switch_policy: SwitchPolicy::default(),
            domain: StimulusDomain::classic(),
            reference_deck: ReferenceDeck::classic(),
        }
    }
}

impl SessionConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: SessionConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(WcstError::InvalidConfig(msg));
        if self.category_threshold == 0 {
            return bad("category_threshold must be positive".into());
        }
        if self.conceptual_run == 0 || self.conceptual_run > self.category_threshold {
            return bad(format!(
                "conceptual_run must be in 1..={}, got {}",
                self.category_threshold, self.conceptual_run
            ));
        }
        if self.set_maintenance_run == 0 || self.set_maintenance_run >= self.category_threshold {
            return bad(format!(
                "set_maintenance_run must be in 1..{}, got {}",
                self.category_threshold, self.set_maintenance_run
            ));
        }
        if self.max_trials == 0 {
            return bad("max_trials must be positive".into());
        }
        if self.max_categories == 0 {
            return bad("max_categories must be positive".into());
        }
        self.domain.validate()
    }

    pub fn criteria(&self) -> ScoringCriteria {
        ScoringCriteria {
            conceptual_run: self.conceptual_run,
            set_maintenance_run: self.set_maintenance_run,
        }
    }
}
