//! End-to-end reschedule flow over the SQLite and in-memory stores.

use adaptive_review::{
    InMemoryStore, PersistenceError, ReviewError, ReviewEvent, ReviewSession, ScheduleState,
    ScheduleStore, SchedulerConfig, SqliteStore, ValidationError, schedule,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 14, 7, 45, 0).unwrap()
}

fn seed_strong_history(store: &SqliteStore, user_id: &str, concept_id: &str) {
    for day in 0..6 {
        let event = ReviewEvent::new(now() - Duration::days(day), 0.9, 4).with_time_taken(25.0);
        store.record_event(user_id, concept_id, &event).unwrap();
    }
}

#[test]
fn test_second_reschedule_reads_first_written_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("reviews.sqlite3")).unwrap();
    seed_strong_history(&store, "ada", "pattern-matching");
    let session = ReviewSession::new(&store, &store);

    let first = session
        .record_review_and_reschedule_at("ada", "pattern-matching", "Pattern matching", now())
        .unwrap();
    let later = first.schedule.next_review;
    let second = session
        .record_review_and_reschedule_at("ada", "pattern-matching", "Pattern matching", later)
        .unwrap();

    assert_eq!(first.schedule.repetitions, 1);
    assert_eq!(second.schedule.repetitions, 2);
    // No new history, so the only difference is the previous interval fed back in
    assert_eq!(second.analysis, first.analysis);
    assert_eq!(
        second.schedule.interval_days,
        schedule(&second.analysis, Some(&first.schedule)).interval_days
    );
    assert_eq!(
        store.get("ada", "pattern-matching").unwrap(),
        Some(second.schedule.clone())
    );
    assert_eq!(
        second.schedule.next_review,
        later + Duration::days(i64::from(second.schedule.interval_days))
    );
}

#[test]
fn test_returned_schedule_matches_stored_one_at_sub_millisecond_time() {
    let store = SqliteStore::open_in_memory().unwrap();
    seed_strong_history(&store, "ada", "iterators");
    let session = ReviewSession::new(&store, &store);
    let at = now() + Duration::nanoseconds(123_456_789);

    let result = session
        .record_review_and_reschedule_at("ada", "iterators", "Iterators", at)
        .unwrap();

    assert_eq!(result.schedule.last_reviewed, at);
    assert_eq!(store.get("ada", "iterators").unwrap(), Some(result.schedule));
}

#[test]
fn test_invalid_event_rejected_and_excluded() {
    let store = SqliteStore::open_in_memory().unwrap();
    seed_strong_history(&store, "ada", "traits");

    let result = store.record_event("ada", "traits", &ReviewEvent::new(now(), 1.5, 4));
    assert!(matches!(
        result,
        Err(ReviewError::Validation(ValidationError::Correctness { .. }))
    ));

    let session = ReviewSession::new(&store, &store);
    let outcome = session
        .record_review_and_reschedule_at("ada", "traits", "Traits", now())
        .unwrap();
    assert!((outcome.analysis.recent_correctness - 0.9).abs() < 1e-9);
}

#[test]
fn test_due_list_follows_schedules() {
    let store = SqliteStore::open_in_memory().unwrap();
    let session = ReviewSession::new(&store, &store);

    for concept in ["closures", "generics", "macros"] {
        session
            .record_review_and_reschedule_at("ada", concept, concept, now())
            .unwrap();
    }

    assert!(store.due_for_review("ada", now()).unwrap().is_empty());
    let due = store.due_for_review("ada", now() + Duration::days(1)).unwrap();
    assert_eq!(due.len(), 3);
    assert!(due.iter().all(|s| s.interval_days == 1));
}

#[test]
fn test_parallel_reschedules_of_different_concepts() {
    let store = SqliteStore::open_in_memory().unwrap();
    let session = ReviewSession::new(&store, &store);
    let concepts: Vec<String> = (0..8).map(|i| format!("concept-{i}")).collect();

    thread::scope(|scope| {
        for concept in &concepts {
            let session = &session;
            scope.spawn(move || {
                for round in 0..3 {
                    session
                        .record_review_and_reschedule_at(
                            "ada",
                            concept,
                            concept,
                            now() + Duration::days(round),
                        )
                        .unwrap();
                }
            });
        }
    });

    for concept in &concepts {
        let state = store.get("ada", concept).unwrap().unwrap();
        assert_eq!(state.repetitions, 3);
    }
}

/// Store that lets another writer slip in just before its first write.
struct RacingStore {
    inner: InMemoryStore,
    raced: AtomicBool,
    upserts: AtomicU32,
}

impl ScheduleStore for RacingStore {
    fn get(
        &self,
        user_id: &str,
        concept_id: &str,
    ) -> Result<Option<ScheduleState>, PersistenceError> {
        self.inner.get(user_id, concept_id)
    }

    fn upsert(&self, state: ScheduleState) -> Result<ScheduleState, PersistenceError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if !self.raced.swap(true, Ordering::SeqCst) {
            let previous = self.inner.get(&state.user_id, &state.concept_id)?;
            let competing = ScheduleState {
                interval_days: 7,
                repetitions: previous.map_or(0, |p| p.repetitions) + 1,
                ..state.clone()
            };
            self.inner.upsert(competing)?;
        }
        self.inner.upsert(state)
    }
}

#[test]
fn test_lost_write_is_retried_against_fresh_state() {
    let store = RacingStore {
        inner: InMemoryStore::new(),
        raced: AtomicBool::new(false),
        upserts: AtomicU32::new(0),
    };
    let history = InMemoryStore::new();
    let session = ReviewSession::new(&history, &store);

    let result = session
        .record_review_and_reschedule_at("ada", "lifetimes", "Lifetimes", now())
        .unwrap();

    assert_eq!(store.upserts.load(Ordering::SeqCst), 2);
    // Built on the competing write, not on the stale empty state
    assert_eq!(result.schedule.repetitions, 2);
    assert_eq!(
        result.schedule.interval_days,
        schedule(&result.analysis, Some(&ScheduleState {
            interval_days: 7,
            ..result.schedule.clone()
        }))
        .interval_days
    );
}

/// Store whose writes always lose.
struct AlwaysStale {
    upserts: AtomicU32,
}

impl ScheduleStore for AlwaysStale {
    fn get(&self, _: &str, _: &str) -> Result<Option<ScheduleState>, PersistenceError> {
        Ok(None)
    }

    fn upsert(&self, state: ScheduleState) -> Result<ScheduleState, PersistenceError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Err(PersistenceError::Conflict {
            user_id: state.user_id,
            concept_id: state.concept_id,
            expected_repetitions: 0,
        })
    }
}

#[test]
fn test_conflict_surfaces_after_max_attempts() {
    let store = AlwaysStale {
        upserts: AtomicU32::new(0),
    };
    let history = InMemoryStore::new();
    let mut config = SchedulerConfig::default();
    config.max_write_attempts = 4;
    let session = ReviewSession::with_config(&history, &store, config).unwrap();

    let err = session
        .record_review_and_reschedule_at("ada", "lifetimes", "Lifetimes", now())
        .unwrap_err();

    assert!(matches!(
        err,
        ReviewError::Persistence(PersistenceError::Conflict { .. })
    ));
    assert_eq!(store.upserts.load(Ordering::SeqCst), 4);
}

/// Store whose database is gone.
struct BrokenStore;

impl ScheduleStore for BrokenStore {
    fn get(&self, _: &str, _: &str) -> Result<Option<ScheduleState>, PersistenceError> {
        Err(PersistenceError::Unavailable("disk full".to_string()))
    }

    fn upsert(&self, state: ScheduleState) -> Result<ScheduleState, PersistenceError> {
        Ok(state)
    }
}

#[test]
fn test_store_failure_is_not_retried() {
    let history = InMemoryStore::new();
    let session = ReviewSession::new(&history, BrokenStore);

    let err = session
        .record_review_and_reschedule_at("ada", "lifetimes", "Lifetimes", now())
        .unwrap_err();
    assert_eq!(err.to_string(), "Store unavailable: disk full");
}
