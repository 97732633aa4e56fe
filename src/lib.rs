//! Adaptive spaced-repetition scheduling.
//!
//! A learner's review history for a concept is summarized into a
//! [`PerformanceAnalysis`], which drives the next review interval and ease factor.
//! [`ReviewSession`] wires both steps to a [`ReviewHistoryProvider`] and a
//! [`ScheduleStore`].

pub mod config;
pub mod database;
pub mod error;
pub mod models;

pub use config::SchedulerConfig;
pub use database::{InMemoryStore, ReviewHistoryProvider, ScheduleStore, SqliteStore};
pub use error::{ConfigError, PersistenceError, Result, ReviewError, ValidationError};
pub use models::{
    ConfidenceTrend, PerformanceAnalysis, Reschedule, ReviewEvent, ReviewSession,
    ScheduleDecision, ScheduleState, analyze, schedule,
};
