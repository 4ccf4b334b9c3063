//! One test administration: session state, trial records, and the host API.
//!
//! A [`Session`] owns everything mutable for one participant: the rule engine,
//! the stimulus deck, and the append-only trial log. The host loop is:
//!
//! 1. [`Session::current_stimulus`]: render it next to the reference cards
//! 2. [`Session::submit_response`]: evaluate and log the trial, then draw the next stimulus
//! 3. repeat while [`Session::is_active`]; [`Session::summary`] at any point
//!
//! Submissions are validated before anything is mutated. The session stops
//! accepting responses after the trial that reaches `max_categories` or
//! `max_trials`, whichever comes first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{classify, Classification, ErrorType, ScoringCriteria};
use crate::config::SessionConfig;
use crate::constants::{APP_VERSION, DEFAULT_MAX_TRIALS, NUM_REFERENCE_CARDS};
use crate::deck::DeckGenerator;
use crate::error::{Result, WcstError};
use crate::prng::{generate_seed, parse_seed};
use crate::rules::{Evaluation, RuleEngine};
use crate::stimulus::ReferenceDeck;
use crate::summary::{compute_summary, SessionSummary};
use crate::types::{Card, Rule};

/// One evaluated trial. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant_id: String,
    pub session_id: String,
    pub trial_index: u32,
    pub stimulus: Card,
    pub selected_index: usize,
    pub correct: bool,
    pub is_perseverative_response: bool,
    pub is_perseverative_error: bool,
    pub is_non_perseverative_error: bool,
    pub is_conceptual_response: bool,
    pub set_maintenance_error: bool,
    pub is_shift_trial: bool,
    /// Rule the trial was evaluated under.
    pub rule: Rule,
    pub prev_rule: Option<Rule>,
    /// Categories completed including this trial.
    pub categories_completed: u32,
    /// Correct run after this trial (0 on the trial completing a category).
    pub consecutive_correct: u32,
    /// Category this trial belongs to (categories completed before it).
    pub category_index: u32,
    pub response_time_ms: f64,
    pub timestamp_utc: DateTime<Utc>,
    pub seed: u64,
    pub device_info: String,
    pub app_version: String,
}

impl TrialRecord {
    pub fn classification(&self) -> Classification {
        Classification {
            is_perseverative_response: self.is_perseverative_response,
            is_perseverative_error: self.is_perseverative_error,
            is_non_perseverative_error: self.is_non_perseverative_error,
            is_conceptual_response: self.is_conceptual_response,
            set_maintenance_error: self.set_maintenance_error,
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.classification().error_type()
    }
}

/// Identity fields echoed on every record of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub participant_id: String,
    pub session_id: String,
    pub seed: u64,
    pub device_info: String,
    pub app_version: String,
}

/// Where the session seed comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedSource {
    Fixed(u64),
    /// Drawn from the OS-seeded RNG at bootstrap; still echoed on every record.
    Generate,
}

/// Host-supplied parameters for starting a session.
#[derive(Clone, Debug)]
pub struct SessionBootstrap {
    pub participant_id: String,
    /// `None` assigns a fresh UUID v4.
    pub session_id: Option<String>,
    pub seed: SeedSource,
    pub device_info: String,
    pub app_version: String,
}

impl SessionBootstrap {
    pub fn new(participant_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            session_id: None,
            seed: SeedSource::Generate,
            device_info: String::new(),
            app_version: APP_VERSION.to_string(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = SeedSource::Fixed(seed);
        self
    }

    /// Seed given as text (e.g. from a form field). Malformed input fails here
    /// rather than being replaced by a generated seed.
    pub fn with_seed_text(self, seed: &str) -> Result<Self> {
        Ok(self.with_seed(parse_seed(seed)?))
    }

    pub fn with_device_info(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = device_info.into();
        self
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    MaxCategories,
    MaxTrials,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed(TerminationReason),
    /// Host withdrew the participant; the partial log stays valid.
    Abandoned,
}

pub struct Session {
    config: SessionConfig,
    criteria: ScoringCriteria,
    meta: SessionMeta,
    deck: DeckGenerator,
    engine: RuleEngine,
    log: Vec<TrialRecord>,
    current: Card,
    status: SessionStatus,
}

impl Session {
    pub fn start(bootstrap: SessionBootstrap, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let session_id = match bootstrap.session_id {
            Some(id) if id.trim().is_empty() => {
                return Err(WcstError::InvalidOperation(
                    "session id must not be empty".into(),
                ))
            }
            Some(id) => id,
            None => uuid::Uuid::new_v4().to_string(),
        };
        let seed = match bootstrap.seed {
            SeedSource::Fixed(s) => s,
            SeedSource::Generate => generate_seed(),
        };

        let deck = DeckGenerator::new(&config.reference_deck, seed);
        let engine = RuleEngine::new(
            config.rule_order,
            config.switch_policy,
            config.category_threshold,
            seed,
        );
        let current = deck.card_at(0);

        tracing::info!(
            participant = %bootstrap.participant_id,
            session = %session_id,
            seed,
            "session started"
        );

        Ok(Self {
            criteria: config.criteria(),
            meta: SessionMeta {
                participant_id: bootstrap.participant_id,
                session_id,
                seed,
                device_info: bootstrap.device_info,
                app_version: bootstrap.app_version,
            },
            deck,
            engine,
            log: Vec::with_capacity(config.max_trials.min(DEFAULT_MAX_TRIALS) as usize),
            current,
            status: SessionStatus::Active,
            config,
        })
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn session_id(&self) -> &str {
        &self.meta.session_id
    }

    pub fn seed(&self) -> u64 {
        self.meta.seed
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn reference_deck(&self) -> &ReferenceDeck {
        &self.config.reference_deck
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Stimulus awaiting a response; `None` once the session is over.
    pub fn current_stimulus(&self) -> Option<Card> {
        self.is_active().then_some(self.current)
    }

    pub fn log(&self) -> &[TrialRecord] {
        &self.log
    }

    pub fn into_log(self) -> Vec<TrialRecord> {
        self.log
    }

    pub fn categories_completed(&self) -> u32 {
        self.engine.categories_completed()
    }

    pub fn summary(&self) -> SessionSummary {
        compute_summary(&self.log)
    }

    /// Submit with the current wall-clock time as the record timestamp.
    pub fn submit_response(&mut self, selected: usize, response_time_ms: f64) -> Result<TrialRecord> {
        self.submit_response_at(selected, response_time_ms, Utc::now())
    }

    pub fn submit_response_at(
        &mut self,
        selected: usize,
        response_time_ms: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<TrialRecord> {
        if !self.is_active() {
            tracing::warn!(session = %self.meta.session_id, status = ?self.status, "response rejected");
            return Err(WcstError::InvalidOperation(format!(
                "session {} is not active ({:?})",
                self.meta.session_id, self.status
            )));
        }
        if selected >= NUM_REFERENCE_CARDS {
            tracing::warn!(session = %self.meta.session_id, selected, "response rejected");
            return Err(WcstError::InvalidSelection {
                index: selected,
                count: NUM_REFERENCE_CARDS,
            });
        }
        if !response_time_ms.is_finite() || response_time_ms < 0.0 {
            tracing::warn!(session = %self.meta.session_id, response_time_ms, "response rejected");
            return Err(WcstError::InvalidResponseTime(response_time_ms));
        }

        let stimulus = self.current;
        let eval = self
            .engine
            .evaluate(&self.config.reference_deck, &stimulus, selected);
        let flags = classify(
            &self.criteria,
            &self.config.reference_deck,
            &stimulus,
            selected,
            &eval,
        );
        let record = self.build_record(stimulus, selected, &eval, &flags, response_time_ms, timestamp);
        self.log.push(record.clone());

        self.status = self.check_termination();
        if let SessionStatus::Completed(reason) = self.status {
            tracing::info!(
                session = %self.meta.session_id,
                trials = self.log.len(),
                categories = self.engine.categories_completed(),
                ?reason,
                "session completed"
            );
        } else {
            self.current = self.deck.card_at(self.log.len() as u64);
        }
        Ok(record)
    }

    /// Mark the session withdrawn. Only an active session can be abandoned.
    pub fn abandon(&mut self) -> Result<()> {
        if !self.is_active() {
            return Err(WcstError::InvalidOperation(format!(
                "session {} is not active ({:?})",
                self.meta.session_id, self.status
            )));
        }
        self.status = SessionStatus::Abandoned;
        tracing::info!(session = %self.meta.session_id, trials = self.log.len(), "session abandoned");
        Ok(())
    }

    fn check_termination(&self) -> SessionStatus {
        if self.engine.categories_completed() >= self.config.max_categories {
            SessionStatus::Completed(TerminationReason::MaxCategories)
        } else if self.log.len() as u32 >= self.config.max_trials {
            SessionStatus::Completed(TerminationReason::MaxTrials)
        } else {
            SessionStatus::Active
        }
    }

    fn build_record(
        &self,
        stimulus: Card,
        selected: usize,
        eval: &Evaluation,
        flags: &Classification,
        response_time_ms: f64,
        timestamp: DateTime<Utc>,
    ) -> TrialRecord {
        TrialRecord {
            participant_id: self.meta.participant_id.clone(),
            session_id: self.meta.session_id.clone(),
            trial_index: self.log.len() as u32,
            stimulus,
            selected_index: selected,
            correct: eval.correct,
            is_perseverative_response: flags.is_perseverative_response,
            is_perseverative_error: flags.is_perseverative_error,
            is_non_perseverative_error: flags.is_non_perseverative_error,
            is_conceptual_response: flags.is_conceptual_response,
            set_maintenance_error: flags.set_maintenance_error,
            is_shift_trial: eval.is_shift_trial,
            rule: eval.rule,
            prev_rule: eval.prev_rule,
            categories_completed: eval.categories_completed,
            consecutive_correct: eval.consecutive_correct,
            category_index: eval.category_index,
            response_time_ms,
            timestamp_utc: timestamp,
            seed: self.meta.seed,
            device_info: self.meta.device_info.clone(),
            app_version: self.meta.app_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimension;

    fn session(seed: u64) -> Session {
        Session::start(
            SessionBootstrap::new("P01").with_session_id("S1").with_seed(seed),
            SessionConfig::default(),
        )
        .unwrap()
    }

    fn correct_choice(s: &Session, rule: Dimension) -> usize {
        let stim = s.current_stimulus().unwrap();
        s.reference_deck().matching_index(&stim, rule)
    }

    #[test]
    fn test_bootstrap_fields_echoed() {
        let mut s = Session::start(
            SessionBootstrap::new("P07")
                .with_session_id("abc")
                .with_seed(31)
                .with_device_info("tablet")
                .with_app_version("9.9"),
            SessionConfig::default(),
        )
        .unwrap();
        let rec = s.submit_response(0, 812.5).unwrap();
        assert_eq!(rec.participant_id, "P07");
        assert_eq!(rec.session_id, "abc");
        assert_eq!(rec.seed, 31);
        assert_eq!(rec.device_info, "tablet");
        assert_eq!(rec.app_version, "9.9");
        assert_eq!(rec.response_time_ms, 812.5);
        assert_eq!(rec.trial_index, 0);
    }

    #[test]
    fn test_generated_ids_and_seed() {
        let s = Session::start(SessionBootstrap::new("P"), SessionConfig::default()).unwrap();
        assert!(uuid::Uuid::parse_str(s.session_id()).is_ok());
        assert!(s.is_active());
    }

    #[test]
    fn test_malformed_seed_rejected_at_bootstrap() {
        let err = SessionBootstrap::new("P").with_seed_text("not-a-seed").unwrap_err();
        assert!(matches!(err, WcstError::InvalidSeed { .. }));
        let ok = SessionBootstrap::new("P").with_seed_text("0x2a").unwrap();
        assert_eq!(ok.seed, SeedSource::Fixed(42));
    }

    #[test]
    fn test_empty_session_id_rejected() {
        let res = Session::start(
            SessionBootstrap::new("P").with_session_id("  "),
            SessionConfig::default(),
        );
        assert!(matches!(res, Err(WcstError::InvalidOperation(_))));
    }

    #[test]
    fn test_invalid_submissions_do_not_mutate() {
        let mut s = session(3);
        let before = s.current_stimulus();
        assert!(matches!(
            s.submit_response(4, 100.0),
            Err(WcstError::InvalidSelection { index: 4, .. })
        ));
        assert!(matches!(
            s.submit_response(0, -1.0),
            Err(WcstError::InvalidResponseTime(_))
        ));
        assert!(s.submit_response(0, f64::NAN).is_err());
        assert!(s.log().is_empty());
        assert_eq!(s.current_stimulus(), before);
    }

    #[test]
    fn test_stimulus_sequence_follows_seed() {
        let mut a = session(11);
        let mut b = session(11);
        for _ in 0..20 {
            assert_eq!(a.current_stimulus(), b.current_stimulus());
            a.submit_response(0, 500.0).unwrap();
            b.submit_response(1, 500.0).unwrap();
        }
    }

    #[test]
    fn test_stops_at_max_categories() {
        let mut config = SessionConfig::default();
        config.max_categories = 2;
        let mut s = Session::start(SessionBootstrap::new("P").with_seed(5), config).unwrap();
        let mut rules = Dimension::ALL.iter().cycle();
        let mut rule = *rules.next().unwrap();
        while s.is_active() {
            let rec = s.submit_response(correct_choice(&s, rule), 400.0).unwrap();
            if rec.consecutive_correct == 0 {
                rule = *rules.next().unwrap();
            }
        }
        assert_eq!(s.log().len(), 20);
        assert_eq!(
            s.status(),
            SessionStatus::Completed(TerminationReason::MaxCategories)
        );
        assert!(s.current_stimulus().is_none());
        assert!(matches!(
            s.submit_response(0, 1.0),
            Err(WcstError::InvalidOperation(_))
        ));
        assert_eq!(s.log().len(), 20);
    }

    #[test]
    fn test_stops_at_max_trials() {
        let mut config = SessionConfig::default();
        config.max_trials = 7;
        let mut s = Session::start(SessionBootstrap::new("P").with_seed(5), config).unwrap();
        for _ in 0..7 {
            s.submit_response(3, 300.0).unwrap();
        }
        assert_eq!(s.status(), SessionStatus::Completed(TerminationReason::MaxTrials));
    }

    #[test]
    fn test_abandon() {
        let mut s = session(8);
        s.submit_response(0, 300.0).unwrap();
        s.abandon().unwrap();
        assert_eq!(s.status(), SessionStatus::Abandoned);
        assert!(s.submit_response(0, 300.0).is_err());
        assert!(s.abandon().is_err());
        assert_eq!(s.summary().total_trials, 1);
    }

    #[test]
    fn test_unbounded_trial_limit_starts() {
        let mut config = SessionConfig::default();
        config.max_trials = u32::MAX;
        config.validate().unwrap();
        let mut s = Session::start(SessionBootstrap::new("P").with_seed(6), config).unwrap();
        let rec = s.submit_response(0, 300.0).unwrap();
        assert_eq!(rec.trial_index, 0);
        assert!(s.is_active());
    }

    #[test]
    fn test_rejected_submission_leaves_log_untouched() {
        let mut s = session(9);
        let before = s.current_stimulus();
        assert!(matches!(
            s.submit_response(4, 300.0),
            Err(WcstError::InvalidSelection { index: 4, count: 4 })
        ));
        assert!(matches!(
            s.submit_response(0, f64::NAN),
            Err(WcstError::InvalidResponseTime(_))
        ));
        assert!(matches!(
            s.submit_response(0, -1.0),
            Err(WcstError::InvalidResponseTime(_))
        ));
        assert!(s.log().is_empty());
        assert_eq!(s.current_stimulus(), before);
    }
}
