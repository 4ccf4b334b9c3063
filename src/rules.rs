//! Hidden-rule state machine.
//!
//! The engine starts on the first rule of its [`RuleOrder`]. Each evaluated
//! trial either extends the consecutive-correct run or resets it. When the run
//! reaches the category threshold the category completes on that same trial:
//! `categories_completed` increments, the run resets to 0, the finished rule
//! becomes `prev_rule`, and a different rule takes effect from the next trial,
//! which is flagged as the shift trial.
//!
//! Trial limits are not enforced here; the owning [`crate::session::Session`]
//! reads [`RuleEngine::categories_completed`] and decides when to stop.

use serde::{Deserialize, Serialize};

use crate::constants::{CATEGORY_THRESHOLD, NUM_DIMENSIONS, RULE_STREAM};
use crate::error::{Result, WcstError};
use crate::prng::SplitMix64;
use crate::stimulus::ReferenceDeck;
use crate::types::{Card, Rule};

/// How the next rule is chosen after a category completes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPolicy {
    /// Next rule in [`RuleOrder`], wrapping around.
    #[default]
    Cyclic,
    /// Uniform over the two other rules, from the session's seeded stream.
    Random,
}

/// A permutation of the three dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct RuleOrder([Rule; NUM_DIMENSIONS]);

impl Default for RuleOrder {
    fn default() -> Self {
        Self(Rule::ALL)
    }
}

impl RuleOrder {
    pub fn new(order: [Rule; NUM_DIMENSIONS]) -> Result<Self> {
        let mut seen = [false; NUM_DIMENSIONS];
        for r in order {
            if std::mem::replace(&mut seen[r.index()], true) {
                return Err(WcstError::InvalidConfig(format!(
                    "rule order repeats '{}'",
                    r
                )));
            }
        }
        Ok(Self(order))
    }

    pub fn first(&self) -> Rule {
        self.0[0]
    }

    pub fn as_slice(&self) -> &[Rule] {
        &self.0
    }

    /// Rule following `rule` in cyclic order.
    pub fn after(&self, rule: Rule) -> Rule {
        let pos = self.0.iter().position(|&r| r == rule).unwrap_or(0);
        self.0[(pos + 1) % NUM_DIMENSIONS]
    }
}

impl TryFrom<Vec<Rule>> for RuleOrder {
    type Error = WcstError;

    fn try_from(v: Vec<Rule>) -> Result<Self> {
        let arr: [Rule; NUM_DIMENSIONS] = v.try_into().map_err(|v: Vec<Rule>| {
            WcstError::InvalidConfig(format!(
                "rule order needs {} rules, got {}",
                NUM_DIMENSIONS,
                v.len()
            ))
        })?;
        Self::new(arr)
    }
}

impl From<RuleOrder> for Vec<Rule> {
    fn from(order: RuleOrder) -> Self {
        order.0.to_vec()
    }
}

/// Outcome of evaluating one response against the hidden rule.
///
/// `rule`, `prev_rule` and `category_index` describe the state the trial was
/// evaluated under; `consecutive_correct` and `categories_completed` are the
/// values after the trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub rule: Rule,
    pub prev_rule: Option<Rule>,
    /// Reference index that was correct under `rule`.
    pub target_index: usize,
    pub correct: bool,
    /// Length of the correct run under `rule` before this trial.
    pub run_before: u32,
    pub consecutive_correct: u32,
    pub categories_completed: u32,
    pub category_index: u32,
    pub is_shift_trial: bool,
    pub category_completed: bool,
}

#[derive(Clone, Debug)]
pub struct RuleEngine {
    order: RuleOrder,
    policy: SwitchPolicy,
    threshold: u32,
    current: Rule,
    prev: Option<Rule>,
    consecutive_correct: u32,
    categories_completed: u32,
    shift_pending: bool,
    rng: SplitMix64,
}

impl RuleEngine {
    pub fn new(order: RuleOrder, policy: SwitchPolicy, threshold: u32, seed: u64) -> Self {
        Self {
            order,
            policy,
            threshold,
            current: order.first(),
            prev: None,
            consecutive_correct: 0,
            categories_completed: 0,
            shift_pending: false,
            rng: SplitMix64::keyed(seed, RULE_STREAM, 0),
        }
    }

    /// Classic administration: color → shape → number, threshold 10, cyclic.
    pub fn classic(seed: u64) -> Self {
        Self::new(
            RuleOrder::default(),
            SwitchPolicy::Cyclic,
            CATEGORY_THRESHOLD,
            seed,
        )
    }

    pub fn current_rule(&self) -> Rule {
        self.current
    }

    pub fn prev_rule(&self) -> Option<Rule> {
        self.prev
    }

    pub fn consecutive_correct(&self) -> u32 {
        self.consecutive_correct
    }

    pub fn categories_completed(&self) -> u32 {
        self.categories_completed
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Score `selected` for `stimulus` and advance the state machine.
    pub fn evaluate(
        &mut self,
        reference: &ReferenceDeck,
        stimulus: &Card,
        selected: usize,
    ) -> Evaluation {
        let rule = self.current;
        let prev_rule = self.prev;
        let category_index = self.categories_completed;
        let run_before = self.consecutive_correct;
        let is_shift_trial = std::mem::take(&mut self.shift_pending);

        let target_index = reference.matching_index(stimulus, rule);
        let correct = selected == target_index;

        let mut category_completed = false;
        if correct {
            self.consecutive_correct += 1;
            if self.consecutive_correct >= self.threshold {
                category_completed = true;
                self.complete_category();
            }
        } else {
            self.consecutive_correct = 0;
        }

        Evaluation {
            rule,
            prev_rule,
            target_index,
            correct,
            run_before,
            consecutive_correct: self.consecutive_correct,
            categories_completed: self.categories_completed,
            category_index,
            is_shift_trial,
            category_completed,
        }
    }

    fn complete_category(&mut self) {
        let finished = self.current;
        self.categories_completed += 1;
        self.consecutive_correct = 0;
        self.prev = Some(finished);
        self.current = self.next_rule(finished);
        self.shift_pending = true;
        tracing::debug!(
            category = self.categories_completed,
            from = %finished,
            to = %self.current,
            "category completed, rule switched"
        );
    }

    fn next_rule(&mut self, finished: Rule) -> Rule {
        match self.policy {
            SwitchPolicy::Cyclic => self.order.after(finished),
            SwitchPolicy::Random => {
                let others: Vec<Rule> = self
                    .order
                    .as_slice()
                    .iter()
                    .copied()
                    .filter(|&r| r != finished)
                    .collect();
                others[self.rng.below(others.len())]
            }
        }
    }
}
