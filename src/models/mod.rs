pub mod analysis;
pub mod analyzer;
pub mod review_event;
pub mod review_session;
pub mod schedule_state;
pub mod scheduler;

pub use analysis::{ConfidenceTrend, PerformanceAnalysis};
pub use analyzer::{analyze, analyze_with};
pub use review_event::ReviewEvent;
pub use review_session::{Reschedule, ReviewSession};
pub use schedule_state::ScheduleState;
pub use scheduler::{ScheduleDecision, schedule, schedule_with};
