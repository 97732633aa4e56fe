//! SQLite persistence for review events and schedules
//!
//! Handles schema initialization, appending review events, history queries,
//! conditional schedule upserts, and due-for-review listing.

use super::{ReviewHistoryProvider, ScheduleStore, conflict};
use crate::error::PersistenceError;
use crate::models::{ReviewEvent, ScheduleState};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Review history and schedules in one SQLite database.
///
/// Instants are stored as Unix nanoseconds, so they read back exactly as written.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const SCHEDULE_COLUMNS: &str = "user_id, concept_id, topic_label, ease_factor, interval_days, repetitions, last_reviewed, next_review";

impl SqliteStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened review database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Creates the required tables on `conn` if they do not exist.
    pub fn from_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS review_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                concept_id TEXT NOT NULL,
                reviewed_at INTEGER NOT NULL,
                correctness REAL NOT NULL,
                confidence_after INTEGER,
                time_taken_minutes REAL
            );

            CREATE INDEX IF NOT EXISTS idx_review_events_concept
                ON review_events (user_id, concept_id, reviewed_at DESC);

            CREATE TABLE IF NOT EXISTS schedules (
                user_id TEXT NOT NULL,
                concept_id TEXT NOT NULL,
                topic_label TEXT NOT NULL,
                ease_factor REAL NOT NULL DEFAULT 2.5,
                interval_days INTEGER NOT NULL DEFAULT 1,
                repetitions INTEGER NOT NULL DEFAULT 0,
                last_reviewed INTEGER NOT NULL,
                next_review INTEGER NOT NULL,
                PRIMARY KEY (user_id, concept_id)
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Unavailable("connection lock poisoned".to_string()))
    }

    /// Validates and appends a review event. Returns the event's row id.
    pub fn record_event(
        &self,
        user_id: &str,
        concept_id: &str,
        event: &ReviewEvent,
    ) -> crate::Result<i64> {
        event.validate(0)?;

        let reviewed_at = to_nanos(&event.timestamp)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO review_events (user_id, concept_id, reviewed_at, correctness, confidence_after, time_taken_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                concept_id,
                reviewed_at,
                event.correctness,
                event.confidence_after,
                event.time_taken_minutes
            ],
        )
        .map_err(PersistenceError::from)?;

        let id = conn.last_insert_rowid();
        debug!(user_id, concept_id, id, "Recorded review event");
        Ok(id)
    }

    /// Schedules for `user_id` whose next review is at or before `now`,
    /// ordered by next review (oldest first).
    pub fn due_for_review(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduleState>, PersistenceError> {
        let now = to_nanos(&now)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules
             WHERE user_id = ?1 AND next_review <= ?2
             ORDER BY next_review ASC"
        ))?;

        let rows = stmt
            .query_map(params![user_id, now], ScheduleRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows.into_iter().map(ScheduleRow::into_state).collect())
    }
}

impl ReviewHistoryProvider for SqliteStore {
    fn fetch(
        &self,
        user_id: &str,
        concept_id: &str,
        limit: usize,
    ) -> Result<Vec<ReviewEvent>, PersistenceError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT reviewed_at, correctness, confidence_after, time_taken_minutes
             FROM review_events
             WHERE user_id = ?1 AND concept_id = ?2
             ORDER BY reviewed_at DESC, id DESC
             LIMIT ?3",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![user_id, concept_id, limit], |row| {
                Ok(ReviewEvent {
                    timestamp: from_nanos(row.get(0)?),
                    correctness: row.get(1)?,
                    // Range checks are left to the analyzer's validation
                    confidence_after: row.get(2)?,
                    time_taken_minutes: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

impl ScheduleStore for SqliteStore {
    fn get(
        &self,
        user_id: &str,
        concept_id: &str,
    ) -> Result<Option<ScheduleState>, PersistenceError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE user_id = ?1 AND concept_id = ?2"
                ),
                params![user_id, concept_id],
                ScheduleRow::from_row,
            )
            .optional()?;

        Ok(row.map(ScheduleRow::into_state))
    }

    fn upsert(&self, state: ScheduleState) -> Result<ScheduleState, PersistenceError> {
        let conn = self.lock()?;

        let expected = state.expected_previous_repetitions();
        let last_reviewed = to_nanos(&state.last_reviewed)?;
        let next_review = to_nanos(&state.next_review)?;

        let changed = if expected == 0 {
            // First review: insert, or replace a row that never recorded a repetition
            conn.execute(
                "INSERT INTO schedules (user_id, concept_id, topic_label, ease_factor, interval_days, repetitions, last_reviewed, next_review)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (user_id, concept_id) DO UPDATE SET
                    topic_label = excluded.topic_label,
                    ease_factor = excluded.ease_factor,
                    interval_days = excluded.interval_days,
                    repetitions = excluded.repetitions,
                    last_reviewed = excluded.last_reviewed,
                    next_review = excluded.next_review
                 WHERE schedules.repetitions = 0",
                params![
                    state.user_id,
                    state.concept_id,
                    state.topic_label,
                    state.ease_factor,
                    state.interval_days,
                    state.repetitions,
                    last_reviewed,
                    next_review
                ],
            )?
        } else {
            conn.execute(
                "UPDATE schedules
                 SET topic_label = ?3, ease_factor = ?4, interval_days = ?5, repetitions = ?6,
                     last_reviewed = ?7, next_review = ?8
                 WHERE user_id = ?1 AND concept_id = ?2 AND repetitions = ?9",
                params![
                    state.user_id,
                    state.concept_id,
                    state.topic_label,
                    state.ease_factor,
                    state.interval_days,
                    state.repetitions,
                    last_reviewed,
                    next_review,
                    expected
                ],
            )?
        };

        if changed == 0 {
            return Err(conflict(&state));
        }

        info!(
            user_id = %state.user_id,
            concept_id = %state.concept_id,
            interval_days = state.interval_days,
            repetitions = state.repetitions,
            "Saved schedule"
        );
        Ok(state)
    }
}

/// Raw `schedules` row before timestamp decoding.
struct ScheduleRow {
    user_id: String,
    concept_id: String,
    topic_label: String,
    ease_factor: f64,
    interval_days: u32,
    repetitions: u32,
    last_reviewed: i64,
    next_review: i64,
}

impl ScheduleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            concept_id: row.get(1)?,
            topic_label: row.get(2)?,
            ease_factor: row.get(3)?,
            interval_days: row.get(4)?,
            repetitions: row.get(5)?,
            last_reviewed: row.get(6)?,
            next_review: row.get(7)?,
        })
    }

    fn into_state(self) -> ScheduleState {
        ScheduleState {
            user_id: self.user_id,
            concept_id: self.concept_id,
            topic_label: self.topic_label,
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            repetitions: self.repetitions,
            last_reviewed: from_nanos(self.last_reviewed),
            next_review: from_nanos(self.next_review),
        }
    }
}

/// Fails outside the years 1677 - 2262.
fn to_nanos(instant: &DateTime<Utc>) -> Result<i64, PersistenceError> {
    instant
        .timestamp_nanos_opt()
        .ok_or_else(|| PersistenceError::InvalidTimestamp(instant.to_rfc3339()))
}

fn from_nanos(nanos: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(nanos)
}
