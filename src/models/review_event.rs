//! A single historical review outcome for a concept.
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub timestamp: DateTime<Utc>,
    /// Fraction of the review answered correctly, 0.0 - 1.0
    pub correctness: f64,
    /// Self-reported confidence after the review, 1 - 5
    pub confidence_after: Option<i64>,
    pub time_taken_minutes: Option<f64>,
}

impl ReviewEvent {
    pub fn new(timestamp: DateTime<Utc>, correctness: f64, confidence_after: i64) -> Self {
        Self {
            timestamp,
            correctness,
            confidence_after: Some(confidence_after),
            time_taken_minutes: None,
        }
    }

    pub fn with_time_taken(mut self, minutes: f64) -> Self {
        self.time_taken_minutes = Some(minutes);
        self
    }

    /// Checks every field against its domain. `index` is reported back in the error.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        // Also rejects NaN
        if !(0.0..=1.0).contains(&self.correctness) {
            return Err(ValidationError::Correctness {
                index,
                value: self.correctness,
            });
        }

        if let Some(confidence) = self.confidence_after {
            if !(1..=5).contains(&confidence) {
                return Err(ValidationError::Confidence {
                    index,
                    value: confidence,
                });
            }
        }

        if let Some(minutes) = self.time_taken_minutes {
            if !minutes.is_finite() || minutes <= 0.0 {
                return Err(ValidationError::TimeTaken {
                    index,
                    value: minutes,
                });
            }
        }

        Ok(())
    }
}

/// Validates a whole history, failing on the first malformed event.
pub fn validate_history(history: &[ReviewEvent]) -> Result<(), ValidationError> {
    history
        .iter()
        .enumerate()
        .try_for_each(|(index, event)| event.validate(index))
}
