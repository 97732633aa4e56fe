//! Review recording and rescheduling for one (user, concept) at a time.
//! Fetches history and the current schedule, analyzes, schedules, and writes back.

use super::analyzer::analyze_with;
use super::scheduler::schedule_with;
use super::{PerformanceAnalysis, ScheduleState};
use crate::config::SchedulerConfig;
use crate::database::{ReviewHistoryProvider, ScheduleStore};
use crate::error::{ConfigError, ReviewError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The schedule written by a review, and the analysis it was computed from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reschedule {
    pub schedule: ScheduleState,
    pub analysis: PerformanceAnalysis,
}

/// Ties the analyzer and scheduler to a history provider and a schedule store.
///
/// Holds no per-review state, so one session can serve any number of users and
/// concepts, from several threads if the collaborators allow it.
pub struct ReviewSession<H, S> {
    history: H,
    store: S,
    config: SchedulerConfig,
}

impl<H, S> ReviewSession<H, S>
where
    H: ReviewHistoryProvider,
    S: ScheduleStore,
{
    pub fn new(history: H, store: S) -> Self {
        Self {
            history,
            store,
            config: SchedulerConfig::default(),
        }
    }

    /// Fails if `config` does not pass [`SchedulerConfig::validate`].
    pub fn with_config(
        history: H,
        store: S,
        config: SchedulerConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            history,
            store,
            config,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reschedules `concept_id` for `user_id` as of now.
    pub fn record_review_and_reschedule(
        &self,
        user_id: &str,
        concept_id: &str,
        topic_label: &str,
    ) -> Result<Reschedule> {
        self.record_review_and_reschedule_at(user_id, concept_id, topic_label, Utc::now())
    }

    /// Reschedules `concept_id` for `user_id` as of `now`.
    ///
    /// A write that loses to a concurrent reschedule of the same pair is recomputed from
    /// the fresh state, up to `max_write_attempts` times. Every other error is returned
    /// unchanged.
    pub fn record_review_and_reschedule_at(
        &self,
        user_id: &str,
        concept_id: &str,
        topic_label: &str,
        now: DateTime<Utc>,
    ) -> Result<Reschedule> {
        let mut attempt = 1;
        loop {
            match self.reschedule_once(user_id, concept_id, topic_label, now) {
                Err(ReviewError::Persistence(e))
                    if e.is_conflict() && attempt < self.config.max_write_attempts =>
                {
                    warn!(user_id, concept_id, attempt, "Schedule changed concurrently, retrying: {}", e);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn reschedule_once(
        &self,
        user_id: &str,
        concept_id: &str,
        topic_label: &str,
        now: DateTime<Utc>,
    ) -> Result<Reschedule> {
        let history = self
            .history
            .fetch(user_id, concept_id, self.config.history_limit)?;
        let previous = self.store.get(user_id, concept_id)?;

        let analysis = analyze_with(&self.config.analysis, &history)?;
        debug!(
            user_id,
            concept_id,
            events = history.len(),
            score = analysis.overall_score,
            trend = analysis.confidence_trend.as_str(),
            variance = analysis.performance_variance,
            "Analyzed review history"
        );

        let decision = schedule_with(&self.config, &analysis, previous.as_ref());
        let next = ScheduleState::after_review(
            previous.as_ref(),
            user_id,
            concept_id,
            topic_label,
            decision,
            now,
        );

        let schedule = self.store.upsert(next)?;
        Ok(Reschedule { schedule, analysis })
    }
}
