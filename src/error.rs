//! Crate-wide error type.
//!
//! The engine itself never fails in normal operation; every variant below is
//! either a caller-usage violation (rejected before any state is touched) or a
//! boundary failure in config loading / CSV import.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WcstError {
    /// Operation not allowed in the session's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("session already exists: {0}")]
    DuplicateSession(String),

    #[error("selected reference index {index} out of range (0..{count})")]
    InvalidSelection { index: usize, count: usize },

    #[error("invalid response time: {0} ms")]
    InvalidResponseTime(f64),

    #[error("invalid seed {input:?}: {reason}")]
    InvalidSeed { input: String, reason: String },

    /// Stimulus domain or reference deck violating the distinct-value rules.
    #[error("invalid stimulus domain: {0}")]
    InvalidDomain(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WcstError>;
