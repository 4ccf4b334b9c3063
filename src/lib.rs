//! # WCST: Wisconsin Card Sorting Test engine
//!
//! Administers and scores a computerized Wisconsin Card Sorting Test. The
//! subject sorts stimulus cards onto four reference cards; a hidden rule
//! (color, shape or number) decides which sort is correct, and the rule
//! switches after each completed category.
//!
//! ## Pipeline
//!
//! | Step | Module | Description |
//! |------|--------|-------------|
//! | 1 | [`deck`] | Draw the next stimulus from the unambiguous stimulus space, keyed by `(seed, trial)` |
//! | 2 | host | Render stimulus + reference cards, capture selection and latency |
//! | 3 | [`rules`] | Score the selection against the hidden rule; complete categories and switch rules |
//! | 4 | [`classifier`] | Tag perseverative / non-perseverative errors, conceptual responses, set loss |
//! | 5 | [`session`] | Append the immutable [`session::TrialRecord`] to the log |
//! | 6 | [`summary`] | Reduce the log into session statistics, at any time |
//!
//! [`session::Session`] ties steps 1–5 together behind `submit_response`.
//! [`export`] writes and re-reads the semicolon-delimited trial table, and
//! [`simulation`] drives sessions with synthetic participants.
//!
//! ## Stimulus space
//!
//! A card is a triple of value indices (color, shape, number) ∈ 0..4³. The
//! reference deck carries each value exactly once per dimension, so every
//! stimulus matches exactly one reference card per dimension. Stimuli whose
//! three matching reference cards are not pairwise distinct are excluded up
//! front, leaving 24 cards. A correct sort is then never consistent with two
//! rules at once.
//!
//! ## Key decisions
//!
//! - **Cyclic switching** by default: color → shape → number → color.
//!   Random switching (uniform over the other two rules, seeded) is opt-in.
//! - **Perseveration** is scored against the immediately preceding rule only;
//!   the first category has no perseverative responses.
//! - **Incremental state**: every per-trial flag comes from the running
//!   counters in the rule engine, never from a scan of the log.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod deck;
pub mod env_config;
pub mod error;
pub mod export;
pub mod prng;
pub mod registry;
pub mod rules;
pub mod session;
pub mod simulation;
pub mod stimulus;
pub mod summary;
pub mod types;

pub use config::SessionConfig;
pub use error::{Result, WcstError};
pub use session::{Session, SessionBootstrap, SessionStatus, TrialRecord};
pub use summary::{compute_summary, SessionSummary};
pub use types::{Card, Dimension, Rule};
