//! Synthetic participants: response models that stand in for a human subject.
//!
//! Each model sees only what a subject sees (the stimulus, the reference
//! cards and correct/incorrect feedback) and never the hidden rule.
//!
//! | Spec | Model |
//! |------|-------|
//! | `ideal` | Eliminates rules inconsistent with feedback; shifts after one error |
//! | `wsls` | Win-stay/lose-shift over a single hypothesized dimension |
//! | `perseverator` | `wsls` until it holds one rule for a full category, then never shifts |
//! | `random` | Uniform over the four reference cards |
//!
//! Any spec takes an optional lapse rate suffix, e.g. `wsls:0.05`: with that
//! probability a response is a uniform random card instead of the model's.

use rand::rngs::SmallRng;
use rand::Rng;
use serde::Serialize;

use crate::constants::{CATEGORY_THRESHOLD, NUM_REFERENCE_CARDS};
use crate::error::{Result, WcstError};
use crate::stimulus::ReferenceDeck;
use crate::types::{Card, Dimension};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantModel {
    IdealObserver,
    WinStayLoseShift,
    Perseverator,
    Random,
}

impl ParticipantModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantModel::IdealObserver => "ideal",
            ParticipantModel::WinStayLoseShift => "wsls",
            ParticipantModel::Perseverator => "perseverator",
            ParticipantModel::Random => "random",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParticipantSpec {
    pub model: ParticipantModel,
    pub lapse: f64,
}

impl ParticipantSpec {
    pub fn new(model: ParticipantModel) -> Self {
        Self { model, lapse: 0.0 }
    }

    /// Parse `"<model>"` or `"<model>:<lapse>"`.
    pub fn from_spec(spec: &str) -> Result<Self> {
        let (name, lapse) = match spec.split_once(':') {
            Some((name, lapse)) => {
                let lapse: f64 = lapse.parse().map_err(|_| {
                    WcstError::InvalidConfig(format!("invalid lapse rate: {}", lapse))
                })?;
                (name, lapse)
            }
            None => (spec, 0.0),
        };
        if !(0.0..=1.0).contains(&lapse) {
            return Err(WcstError::InvalidConfig(format!(
                "lapse rate must be in [0, 1], got {}",
                lapse
            )));
        }
        let model = match name {
            "ideal" => ParticipantModel::IdealObserver,
            "wsls" => ParticipantModel::WinStayLoseShift,
            "perseverator" => ParticipantModel::Perseverator,
            "random" => ParticipantModel::Random,
            other => {
                return Err(WcstError::InvalidConfig(format!(
                    "unknown participant model: {}",
                    other
                )))
            }
        };
        Ok(Self { model, lapse })
    }

    pub fn name(&self) -> String {
        if self.lapse > 0.0 {
            format!("{}:{}", self.model.as_str(), self.lapse)
        } else {
            self.model.as_str().to_string()
        }
    }
}

/// Response model state for one simulated session.
pub struct SyntheticParticipant {
    spec: ParticipantSpec,
    /// Rules still consistent with feedback (ideal observer).
    candidates: Vec<Dimension>,
    /// Dimension currently sorted by (wsls / perseverator).
    hypothesis: Dimension,
    streak: u32,
    locked: bool,
}

impl SyntheticParticipant {
    pub fn new(spec: ParticipantSpec) -> Self {
        Self {
            spec,
            candidates: Dimension::ALL.to_vec(),
            hypothesis: Dimension::ALL[0],
            streak: 0,
            locked: false,
        }
    }

    fn preferred(&self) -> Dimension {
        match self.spec.model {
            ParticipantModel::IdealObserver => self
                .candidates
                .first()
                .copied()
                .unwrap_or(Dimension::ALL[0]),
            _ => self.hypothesis,
        }
    }

    pub fn choose(&mut self, reference: &ReferenceDeck, stimulus: &Card, rng: &mut SmallRng) -> usize {
        if self.spec.model == ParticipantModel::Random
            || (self.spec.lapse > 0.0 && rng.random_bool(self.spec.lapse))
        {
            return rng.random_range(0..NUM_REFERENCE_CARDS);
        }
        reference.matching_index(stimulus, self.preferred())
    }

    /// Update on feedback for the card actually chosen.
    pub fn observe(
        &mut self,
        reference: &ReferenceDeck,
        stimulus: &Card,
        choice: usize,
        correct: bool,
        rng: &mut SmallRng,
    ) {
        match self.spec.model {
            ParticipantModel::Random => {}
            ParticipantModel::IdealObserver => {
                let consistent = reference.rules_consistent_with(stimulus, choice);
                if correct {
                    self.candidates.retain(|d| consistent.contains(d));
                    if self.candidates.is_empty() {
                        self.candidates = consistent;
                    }
                } else {
                    self.candidates.retain(|d| !consistent.contains(d));
                    if self.candidates.is_empty() {
                        // The rule moved: restart over everything just refuted.
                        self.candidates = Dimension::ALL
                            .into_iter()
                            .filter(|d| !consistent.contains(d))
                            .collect();
                    }
                }
            }
            ParticipantModel::WinStayLoseShift | ParticipantModel::Perseverator => {
                if correct {
                    self.streak += 1;
                    if self.spec.model == ParticipantModel::Perseverator
                        && self.streak >= CATEGORY_THRESHOLD
                    {
                        self.locked = true;
                    }
                } else {
                    self.streak = 0;
                    if !self.locked {
                        let others: Vec<Dimension> = Dimension::ALL
                            .into_iter()
                            .filter(|&d| d != self.hypothesis)
                            .collect();
                        self.hypothesis = others[rng.random_range(0..others.len())];
                    }
                }
            }
        }
    }
}
