//! In-process store, for tests and embedders without a database.
use super::{ReviewHistoryProvider, ScheduleStore, conflict};
use crate::error::PersistenceError;
use crate::models::{ReviewEvent, ScheduleState};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Key = (String, String);

#[derive(Default)]
struct Inner {
    /// Kept oldest first, in insertion order
    events: HashMap<Key, Vec<ReviewEvent>>,
    schedules: HashMap<Key, ScheduleState>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

fn key(user_id: &str, concept_id: &str) -> Key {
    (user_id.to_string(), concept_id.to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, PersistenceError> {
        self.inner
            .lock()
            .map_err(|_| PersistenceError::Unavailable("store lock poisoned".to_string()))
    }

    /// Validates and appends a review event.
    pub fn record_event(
        &self,
        user_id: &str,
        concept_id: &str,
        event: ReviewEvent,
    ) -> crate::Result<()> {
        event.validate(0)?;
        self.lock()?
            .events
            .entry(key(user_id, concept_id))
            .or_default()
            .push(event);
        Ok(())
    }

    pub fn due_for_review(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduleState>, PersistenceError> {
        let inner = self.lock()?;
        let mut due: Vec<ScheduleState> = inner
            .schedules
            .values()
            .filter(|s| s.user_id == user_id && s.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|s| s.next_review);
        Ok(due)
    }
}

impl ReviewHistoryProvider for InMemoryStore {
    fn fetch(
        &self,
        user_id: &str,
        concept_id: &str,
        limit: usize,
    ) -> Result<Vec<ReviewEvent>, PersistenceError> {
        let inner = self.lock()?;
        let Some(events) = inner.events.get(&key(user_id, concept_id)) else {
            return Ok(Vec::new());
        };

        let mut history = events.clone();
        // Ties: later insertions first
        history.sort_by_key(|e| e.timestamp);
        history.reverse();
        history.truncate(limit);
        Ok(history)
    }
}

impl ScheduleStore for InMemoryStore {
    fn get(
        &self,
        user_id: &str,
        concept_id: &str,
    ) -> Result<Option<ScheduleState>, PersistenceError> {
        Ok(self
            .lock()?
            .schedules
            .get(&key(user_id, concept_id))
            .cloned())
    }

    fn upsert(&self, state: ScheduleState) -> Result<ScheduleState, PersistenceError> {
        let mut inner = self.lock()?;
        let k = key(&state.user_id, &state.concept_id);

        let current = inner.schedules.get(&k).map_or(0, |s| s.repetitions);
        if current != state.expected_previous_repetitions() {
            return Err(conflict(&state));
        }

        inner.schedules.insert(k, state.clone());
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleDecision;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_fetch_orders_and_limits() {
        let store = InMemoryStore::new();
        for day in [3, 1, 4, 2] {
            store
                .record_event("u", "c", ReviewEvent::new(now() + Duration::days(day), 0.5, 3))
                .unwrap();
        }

        let history = store.fetch("u", "c", 3).unwrap();
        let days: Vec<i64> = history
            .iter()
            .map(|e| (e.timestamp - now()).num_days())
            .collect();
        assert_eq!(days, vec![4, 3, 2]);
        assert!(store.fetch("u", "other", 20).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_is_conditional() {
        let store = InMemoryStore::new();
        let decision = ScheduleDecision {
            interval_days: 2,
            ease_factor: 2.5,
        };
        let first = ScheduleState::after_review(None, "u", "c", "Closures", decision, now());
        store.upsert(first.clone()).unwrap();

        let stale = ScheduleState::after_review(None, "u", "c", "Closures", decision, now());
        assert!(store.upsert(stale).unwrap_err().is_conflict());

        let next = ScheduleState::after_review(Some(&first), "u", "c", "Closures", decision, now());
        assert_eq!(store.upsert(next.clone()).unwrap().repetitions, 2);
        assert_eq!(store.due_for_review("u", now() + Duration::days(2)).unwrap(), vec![next]);
    }
}
