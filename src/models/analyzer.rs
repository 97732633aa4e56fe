//! Performance analysis over a concept's review history.
//!
//! The history is ordered most-recent-first. The first `recent_window` events form the
//! "recent" slice and the remainder the "older" slice:
//! - Correctness and confidence are averaged per slice; the older slice falls back to
//!   the recent one when empty
//! - Confidence trend compares the two confidence averages
//! - Time efficiency is `target_minutes / max(mean recent minutes, 1)`, clamped
//! - Overall score blends recent correctness, recent confidence and time efficiency
//! - Variance is the population standard deviation of correctness over the whole history

use super::review_event::validate_history;
use super::{ConfidenceTrend, PerformanceAnalysis, ReviewEvent};
use crate::config::{AnalysisConfig, EFFICIENCY_SCORE_SCALE, MAX_CONFIDENCE};
use crate::error::ValidationError;

/// Analyzes `history` with the default weights.
pub fn analyze(history: &[ReviewEvent]) -> Result<PerformanceAnalysis, ValidationError> {
    analyze_with(&AnalysisConfig::default(), history)
}

/// Analyzes `history` (most recent first). Malformed events are rejected before
/// anything is computed.
pub fn analyze_with(
    config: &AnalysisConfig,
    history: &[ReviewEvent],
) -> Result<PerformanceAnalysis, ValidationError> {
    validate_history(history)?;

    if history.is_empty() {
        return Ok(PerformanceAnalysis::default());
    }

    let split = config.recent_window.min(history.len());
    let (recent, older) = history.split_at(split);

    let correctness = |e: &ReviewEvent| e.correctness;
    let confidence = |e: &ReviewEvent| {
        // Validated to 1 - 5, so the cast is exact
        e.confidence_after
            .map_or(config.default_confidence, |c| c as f64)
    };
    let minutes = |e: &ReviewEvent| e.time_taken_minutes.unwrap_or(config.default_time_minutes);

    let recent_correctness = mean(recent, correctness);
    let recent_confidence = mean(recent, confidence);
    let older_confidence = if older.is_empty() {
        recent_confidence
    } else {
        mean(older, confidence)
    };

    let confidence_trend = ConfidenceTrend::between(recent_confidence, older_confidence);

    let average_time = mean(recent, minutes);
    let time_efficiency = (config.target_minutes / average_time.max(1.0))
        .clamp(config.min_time_efficiency, config.max_time_efficiency);

    let overall_score = (config.correctness_weight * recent_correctness
        + config.confidence_weight * (recent_confidence / MAX_CONFIDENCE)
        + config.efficiency_weight * (time_efficiency / EFFICIENCY_SCORE_SCALE))
        .clamp(config.min_overall_score, config.max_overall_score);

    let performance_variance = std_dev(history, correctness);

    Ok(PerformanceAnalysis {
        overall_score,
        confidence_trend,
        time_efficiency,
        recent_correctness,
        average_confidence: recent_confidence,
        performance_variance,
    })
}

fn mean(events: &[ReviewEvent], value: impl Fn(&ReviewEvent) -> f64) -> f64 {
    events.iter().map(value).sum::<f64>() / events.len() as f64
}

/// Population standard deviation.
fn std_dev(events: &[ReviewEvent], value: impl Fn(&ReviewEvent) -> f64 + Copy) -> f64 {
    let avg = mean(events, value);
    let squared = events
        .iter()
        .map(|e| (value(e) - avg).powi(2))
        .sum::<f64>();
    (squared / events.len() as f64).sqrt()
}
