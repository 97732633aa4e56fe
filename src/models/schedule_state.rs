//! Persisted per-(user, concept) review schedule.
use super::scheduler::ScheduleDecision;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub user_id: String,
    pub concept_id: String,
    pub topic_label: String,
    /// Always within 1.3 - 3.0
    pub ease_factor: f64,
    /// Always within 1 - 30
    pub interval_days: u32,
    /// Number of reviews recorded so far, never decreases
    pub repetitions: u32,
    pub last_reviewed: DateTime<Utc>,
    /// `last_reviewed + interval_days`
    pub next_review: DateTime<Utc>,
}

impl ScheduleState {
    /// Builds the state that replaces `previous` after a review at `now`.
    ///
    /// An absent `previous` counts as zero repetitions.
    pub fn after_review(
        previous: Option<&ScheduleState>,
        user_id: &str,
        concept_id: &str,
        topic_label: &str,
        decision: ScheduleDecision,
        now: DateTime<Utc>,
    ) -> ScheduleState {
        let repetitions = previous.map_or(0, |p| p.repetitions) + 1;

        ScheduleState {
            user_id: user_id.to_string(),
            concept_id: concept_id.to_string(),
            topic_label: topic_label.to_string(),
            ease_factor: decision.ease_factor,
            interval_days: decision.interval_days,
            repetitions,
            last_reviewed: now,
            next_review: now + Duration::days(i64::from(decision.interval_days)),
        }
    }

    /// Repetition count the store must still hold for this state to be written.
    pub fn expected_previous_repetitions(&self) -> u32 {
        self.repetitions.saturating_sub(1)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}
