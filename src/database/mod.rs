//! Collaborators that supply review history and persist schedules.
//!
//! Both are keyed by `(user_id, concept_id)`. Implementations report their own
//! failures as [`PersistenceError`]; the scheduling core never retries or hides them,
//! except for a lost conditional write, which is retried against the fresh state.

pub mod db;
pub mod memory;

use crate::error::PersistenceError;
use crate::models::{ReviewEvent, ScheduleState};

pub use db::SqliteStore;
pub use memory::InMemoryStore;

/// Read-only source of review history.
pub trait ReviewHistoryProvider {
    /// Returns at most `limit` events, most recent first.
    fn fetch(
        &self,
        user_id: &str,
        concept_id: &str,
        limit: usize,
    ) -> Result<Vec<ReviewEvent>, PersistenceError>;
}

/// Keyed storage of the current schedule per (user, concept).
pub trait ScheduleStore {
    fn get(&self, user_id: &str, concept_id: &str)
    -> Result<Option<ScheduleState>, PersistenceError>;

    /// Replaces the stored schedule with `state`, but only if the stored one still has
    /// `state.repetitions - 1` repetitions (or is absent when `state.repetitions` is 1).
    /// Otherwise fails with [`PersistenceError::Conflict`].
    fn upsert(&self, state: ScheduleState) -> Result<ScheduleState, PersistenceError>;
}

impl<T: ReviewHistoryProvider + ?Sized> ReviewHistoryProvider for &T {
    fn fetch(
        &self,
        user_id: &str,
        concept_id: &str,
        limit: usize,
    ) -> Result<Vec<ReviewEvent>, PersistenceError> {
        (**self).fetch(user_id, concept_id, limit)
    }
}

impl<T: ScheduleStore + ?Sized> ScheduleStore for &T {
    fn get(
        &self,
        user_id: &str,
        concept_id: &str,
    ) -> Result<Option<ScheduleState>, PersistenceError> {
        (**self).get(user_id, concept_id)
    }

    fn upsert(&self, state: ScheduleState) -> Result<ScheduleState, PersistenceError> {
        (**self).upsert(state)
    }
}

pub(crate) fn conflict(state: &ScheduleState) -> PersistenceError {
    PersistenceError::Conflict {
        user_id: state.user_id.clone(),
        concept_id: state.concept_id.clone(),
        expected_repetitions: state.expected_previous_repetitions(),
    }
}
