//! Session simulation with synthetic participants.
//!
//! - [`participant`]: Response models (ideal observer, win-stay/lose-shift, perseverator, random)
//! - [`engine`]: Run one session or a parallel batch to completion
//! - [`statistics`]: Aggregate batch summaries into mean/std/min/max per metric

pub mod engine;
pub mod participant;
pub mod statistics;

pub use engine::{simulate_batch, simulate_session, SimulationResult};
pub use participant::{ParticipantModel, ParticipantSpec, SyntheticParticipant};
pub use statistics::{aggregate_batch, save_statistics, BatchStatistics, MetricStatistics};
