//! Adaptive SM-2 style interval scheduling.
//!
//! The next interval grows from the previous one by a multiplier chosen from the
//! overall performance score, then is adjusted for:
//! - Confidence trend: improving learners are pushed further out, declining ones pulled in
//! - Performance variance: erratic results shorten the interval, consistent ones lengthen it
//! - Time efficiency: faster reviews lengthen the interval, within fixed bounds
//!
//! The ease factor is derived from the same score and trend and is always kept
//! within 1.3 - 3.0. Score tiers are ordered tables evaluated top-down, so a score
//! sitting exactly on a boundary belongs to the higher tier.

use super::{ConfidenceTrend, PerformanceAnalysis, ScheduleState};
use crate::config::{EaseConfig, IntervalConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output of the scheduler for one review.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDecision {
    pub interval_days: u32,
    pub ease_factor: f64,
}

/// A score band: applies to scores `>= lower_bound` not claimed by an earlier tier.
#[derive(Clone, Copy, Debug)]
pub struct ScoreTier<F> {
    pub name: &'static str,
    pub lower_bound: f64,
    pub formula: F,
}

/// `(base interval, score) -> interval`
pub type IntervalFormula = fn(f64, f64) -> f64;
/// `(score, ease settings) -> ease factor`
pub type EaseFormula = fn(f64, &EaseConfig) -> f64;

pub const INTERVAL_TIERS: [ScoreTier<IntervalFormula>; 4] = [
    ScoreTier {
        name: "mastered",
        lower_bound: 0.8,
        formula: mastered_interval,
    },
    ScoreTier {
        name: "progressing",
        lower_bound: 0.6,
        formula: progressing_interval,
    },
    ScoreTier {
        name: "developing",
        lower_bound: 0.4,
        formula: developing_interval,
    },
    ScoreTier {
        name: "struggling",
        lower_bound: f64::NEG_INFINITY,
        formula: struggling_interval,
    },
];

pub const EASE_TIERS: [ScoreTier<EaseFormula>; 4] = [
    ScoreTier {
        name: "mastered",
        lower_bound: 0.8,
        formula: mastered_ease,
    },
    ScoreTier {
        name: "progressing",
        lower_bound: 0.6,
        formula: progressing_ease,
    },
    ScoreTier {
        name: "developing",
        lower_bound: 0.4,
        formula: developing_ease,
    },
    ScoreTier {
        name: "struggling",
        lower_bound: f64::NEG_INFINITY,
        formula: struggling_ease,
    },
];

fn mastered_interval(base: f64, p: f64) -> f64 {
    base * (2.5 + (p - 0.8) * 2.0)
}

fn progressing_interval(base: f64, p: f64) -> f64 {
    base * (1.5 + (p - 0.6) * 1.5)
}

fn developing_interval(base: f64, p: f64) -> f64 {
    base * (1.0 + (p - 0.4) * 0.5)
}

fn struggling_interval(base: f64, p: f64) -> f64 {
    (base * (0.5 + p * 0.5)).max(1.0)
}

fn mastered_ease(p: f64, _ease: &EaseConfig) -> f64 {
    2.8 + (p - 0.8) * 0.5
}

fn progressing_ease(p: f64, ease: &EaseConfig) -> f64 {
    ease.default_ease + (p - 0.6) * 0.3
}

fn developing_ease(_p: f64, ease: &EaseConfig) -> f64 {
    ease.default_ease
}

fn struggling_ease(p: f64, ease: &EaseConfig) -> f64 {
    (ease.default_ease - (0.4 - p) * 2.0).max(ease.min_ease)
}

/// Picks the first tier whose lower bound the score reaches; the last tier catches the rest.
pub fn select_tier<F, const N: usize>(tiers: &[ScoreTier<F>; N], score: f64) -> &ScoreTier<F> {
    tiers
        .iter()
        .find(|tier| score >= tier.lower_bound)
        .unwrap_or(&tiers[N - 1])
}

/// Schedules with the default configuration.
pub fn schedule(analysis: &PerformanceAnalysis, previous: Option<&ScheduleState>) -> ScheduleDecision {
    schedule_with(&SchedulerConfig::default(), analysis, previous)
}

/// Computes the next interval and ease factor. A missing `previous` is a new concept
/// with a base interval of one day.
pub fn schedule_with(
    config: &SchedulerConfig,
    analysis: &PerformanceAnalysis,
    previous: Option<&ScheduleState>,
) -> ScheduleDecision {
    let base = previous.map_or(1.0, |p| f64::from(p.interval_days));

    let decision = ScheduleDecision {
        interval_days: next_interval(&config.interval, analysis, base),
        ease_factor: next_ease_factor(&config.ease, analysis),
    };

    debug!(
        score = analysis.overall_score,
        trend = analysis.confidence_trend.as_str(),
        base_interval = base,
        interval_days = decision.interval_days,
        ease_factor = decision.ease_factor,
        "Computed schedule decision"
    );

    decision
}

/// Next interval in whole days, within `[min_days, max_days]`.
pub fn next_interval(config: &IntervalConfig, analysis: &PerformanceAnalysis, base: f64) -> u32 {
    let score = analysis.overall_score;
    let tier = select_tier(&INTERVAL_TIERS, score);

    let trend = match analysis.confidence_trend {
        ConfidenceTrend::Improving => config.improving_multiplier,
        ConfidenceTrend::Declining => config.declining_multiplier,
        ConfidenceTrend::Stable => 1.0,
    };

    let variance = if analysis.performance_variance > config.high_variance_threshold {
        config.high_variance_multiplier
    } else if analysis.performance_variance < config.low_variance_threshold {
        config.low_variance_multiplier
    } else {
        1.0
    };

    let efficiency = analysis
        .time_efficiency
        .clamp(config.min_efficiency_multiplier, config.max_efficiency_multiplier);

    let raw = (tier.formula)(base, score) * trend * variance * efficiency;

    let min = f64::from(config.min_days);
    let max = f64::from(config.max_days);
    // NaN only reaches here through a hand-built analysis
    let bounded = if raw.is_nan() { min } else { raw.clamp(min, max) };

    bounded.round() as u32
}

/// Ease factor within `[min_ease, max_ease]`.
pub fn next_ease_factor(config: &EaseConfig, analysis: &PerformanceAnalysis) -> f64 {
    let score = analysis.overall_score;
    let tier = select_tier(&EASE_TIERS, score);

    let adjusted = (tier.formula)(score, config)
        + match analysis.confidence_trend {
            ConfidenceTrend::Improving => config.trend_step,
            ConfidenceTrend::Declining => -config.trend_step,
            ConfidenceTrend::Stable => 0.0,
        };

    if adjusted.is_nan() {
        return config.default_ease.clamp(config.min_ease, config.max_ease);
    }
    adjusted.clamp(config.min_ease, config.max_ease)
}
