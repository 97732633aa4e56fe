//! Error types for review analysis, scheduling and persistence.

use thiserror::Error;

/// A review event field outside its declared domain.
///
/// `index` is the position of the offending event in the supplied history.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Event {index}: correctness {value} is outside [0, 1]")]
    Correctness { index: usize, value: f64 },

    #[error("Event {index}: confidence {value} is outside [1, 5]")]
    Confidence { index: usize, value: i64 },

    #[error("Event {index}: time taken {value} minutes must be a positive number")]
    TimeTaken { index: usize, value: f64 },
}

/// Failure inside a history provider or schedule store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Conditional write lost against a newer schedule
    #[error(
        "Write conflict for user '{user_id}' concept '{concept_id}': stored schedule no longer has {expected_repetitions} repetitions"
    )]
    Conflict {
        user_id: String,
        concept_id: String,
        expected_repetitions: u32,
    },

    /// Stored instant could not be decoded
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Store cannot serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, PersistenceError::Conflict { .. })
    }
}

/// Error returned by [`crate::ReviewSession`].
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
