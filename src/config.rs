//! Tunable constants for the performance analyzer and interval scheduler.
//!
//! Every number the algorithms use is declared once here. `SchedulerConfig::default()`
//! reproduces the stock behaviour; a JSON file can override any subset of fields.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV_VAR: &str = "ADAPTIVE_REVIEW_CONFIG";

// Analyzer
pub const RECENT_WINDOW: usize = 5;
pub const DEFAULT_TIME_MINUTES: f64 = 30.0;
pub const DEFAULT_CONFIDENCE: f64 = 3.0;
pub const MAX_CONFIDENCE: f64 = 5.0;
pub const TARGET_MINUTES: f64 = 60.0;
pub const MIN_TIME_EFFICIENCY: f64 = 0.1;
pub const MAX_TIME_EFFICIENCY: f64 = 2.0;
pub const CORRECTNESS_WEIGHT: f64 = 0.6;
pub const CONFIDENCE_WEIGHT: f64 = 0.3;
pub const EFFICIENCY_WEIGHT: f64 = 0.1;
/// Divisor mapping time efficiency onto the score scale; independent of the efficiency clamp
pub const EFFICIENCY_SCORE_SCALE: f64 = 2.0;
pub const MIN_OVERALL_SCORE: f64 = 0.1;
pub const MAX_OVERALL_SCORE: f64 = 1.0;

// Interval
pub const MIN_INTERVAL_DAYS: u32 = 1;
pub const MAX_INTERVAL_DAYS: u32 = 30;
pub const IMPROVING_MULTIPLIER: f64 = 1.2;
pub const DECLINING_MULTIPLIER: f64 = 0.8;
pub const HIGH_VARIANCE_THRESHOLD: f64 = 0.3;
pub const LOW_VARIANCE_THRESHOLD: f64 = 0.1;
pub const HIGH_VARIANCE_MULTIPLIER: f64 = 0.7;
pub const LOW_VARIANCE_MULTIPLIER: f64 = 1.1;
pub const MIN_EFFICIENCY_MULTIPLIER: f64 = 0.8;
pub const MAX_EFFICIENCY_MULTIPLIER: f64 = 1.5;

// Ease factor
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 3.0;
pub const EASE_TREND_STEP: f64 = 0.1;

// Collaborators
pub const HISTORY_LIMIT: usize = 20;
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Inputs to the performance analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of most recent events treated as "recent"
    pub recent_window: usize,
    pub default_time_minutes: f64,
    pub default_confidence: f64,
    /// Review duration that yields a time efficiency of 1.0
    pub target_minutes: f64,
    pub min_time_efficiency: f64,
    pub max_time_efficiency: f64,
    pub correctness_weight: f64,
    pub confidence_weight: f64,
    pub efficiency_weight: f64,
    pub min_overall_score: f64,
    pub max_overall_score: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            recent_window: RECENT_WINDOW,
            default_time_minutes: DEFAULT_TIME_MINUTES,
            default_confidence: DEFAULT_CONFIDENCE,
            target_minutes: TARGET_MINUTES,
            min_time_efficiency: MIN_TIME_EFFICIENCY,
            max_time_efficiency: MAX_TIME_EFFICIENCY,
            correctness_weight: CORRECTNESS_WEIGHT,
            confidence_weight: CONFIDENCE_WEIGHT,
            efficiency_weight: EFFICIENCY_WEIGHT,
            min_overall_score: MIN_OVERALL_SCORE,
            max_overall_score: MAX_OVERALL_SCORE,
        }
    }
}

/// Adjustments applied after the score tier multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    pub min_days: u32,
    pub max_days: u32,
    pub improving_multiplier: f64,
    pub declining_multiplier: f64,
    pub high_variance_threshold: f64,
    pub low_variance_threshold: f64,
    pub high_variance_multiplier: f64,
    pub low_variance_multiplier: f64,
    pub min_efficiency_multiplier: f64,
    pub max_efficiency_multiplier: f64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            min_days: MIN_INTERVAL_DAYS,
            max_days: MAX_INTERVAL_DAYS,
            improving_multiplier: IMPROVING_MULTIPLIER,
            declining_multiplier: DECLINING_MULTIPLIER,
            high_variance_threshold: HIGH_VARIANCE_THRESHOLD,
            low_variance_threshold: LOW_VARIANCE_THRESHOLD,
            high_variance_multiplier: HIGH_VARIANCE_MULTIPLIER,
            low_variance_multiplier: LOW_VARIANCE_MULTIPLIER,
            min_efficiency_multiplier: MIN_EFFICIENCY_MULTIPLIER,
            max_efficiency_multiplier: MAX_EFFICIENCY_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EaseConfig {
    pub default_ease: f64,
    pub min_ease: f64,
    pub max_ease: f64,
    pub trend_step: f64,
}

impl Default for EaseConfig {
    fn default() -> Self {
        Self {
            default_ease: DEFAULT_EASE_FACTOR,
            min_ease: MIN_EASE_FACTOR,
            max_ease: MAX_EASE_FACTOR,
            trend_step: EASE_TREND_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub analysis: AnalysisConfig,
    pub interval: IntervalConfig,
    pub ease: EaseConfig,
    /// Maximum number of history events fetched per reschedule
    pub history_limit: usize,
    /// Attempts at the read-compute-upsert cycle before a conflict is surfaced
    pub max_write_attempts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            interval: IntervalConfig::default(),
            ease: EaseConfig::default(),
            history_limit: HISTORY_LIMIT,
            max_write_attempts: MAX_WRITE_ATTEMPTS,
        }
    }
}

impl SchedulerConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: SchedulerConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `ADAPTIVE_REVIEW_CONFIG`, or the defaults when unset.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Rejects settings the analyzer or scheduler cannot compute with: non-finite
    /// numbers, inverted bounds and zero limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        let i = &self.interval;
        let e = &self.ease;

        let reals = [
            ("analysis.default_time_minutes", a.default_time_minutes),
            ("analysis.default_confidence", a.default_confidence),
            ("analysis.target_minutes", a.target_minutes),
            ("analysis.min_time_efficiency", a.min_time_efficiency),
            ("analysis.max_time_efficiency", a.max_time_efficiency),
            ("analysis.correctness_weight", a.correctness_weight),
            ("analysis.confidence_weight", a.confidence_weight),
            ("analysis.efficiency_weight", a.efficiency_weight),
            ("analysis.min_overall_score", a.min_overall_score),
            ("analysis.max_overall_score", a.max_overall_score),
            ("interval.improving_multiplier", i.improving_multiplier),
            ("interval.declining_multiplier", i.declining_multiplier),
            ("interval.high_variance_threshold", i.high_variance_threshold),
            ("interval.low_variance_threshold", i.low_variance_threshold),
            ("interval.high_variance_multiplier", i.high_variance_multiplier),
            ("interval.low_variance_multiplier", i.low_variance_multiplier),
            ("interval.min_efficiency_multiplier", i.min_efficiency_multiplier),
            ("interval.max_efficiency_multiplier", i.max_efficiency_multiplier),
            ("ease.default_ease", e.default_ease),
            ("ease.min_ease", e.min_ease),
            ("ease.max_ease", e.max_ease),
            ("ease.trend_step", e.trend_step),
        ];
        if let Some((name, value)) = reals.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be finite, got {value}")));
        }

        if a.recent_window == 0 {
            return Err(ConfigError::Invalid("recent_window must be at least 1".into()));
        }
        if a.min_time_efficiency > a.max_time_efficiency {
            return Err(invalid_bounds("time efficiency"));
        }
        if a.min_overall_score > a.max_overall_score {
            return Err(invalid_bounds("overall score"));
        }
        if i.min_days == 0 || i.min_days > i.max_days {
            return Err(invalid_bounds("interval days"));
        }
        if i.low_variance_threshold > i.high_variance_threshold {
            return Err(invalid_bounds("variance threshold"));
        }
        if i.min_efficiency_multiplier > i.max_efficiency_multiplier {
            return Err(invalid_bounds("efficiency multiplier"));
        }
        if e.min_ease > e.max_ease {
            return Err(invalid_bounds("ease factor"));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("history_limit must be at least 1".into()));
        }
        if self.max_write_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_write_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn invalid_bounds(what: &str) -> ConfigError {
    ConfigError::Invalid(format!("{what} lower bound exceeds upper bound"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SchedulerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.correctness_weight, 0.6);
        assert_eq!(config.ease.default_ease, 2.5);
        assert_eq!(config.interval.max_days, 30);
        assert_eq!(config.history_limit, 20);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "interval": {{ "max_days": 60 }}, "max_write_attempts": 5 }}"#
        )
        .unwrap();

        let config = SchedulerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.interval.max_days, 60);
        assert_eq!(config.interval.min_days, 1);
        assert_eq!(config.max_write_attempts, 5);
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = SchedulerConfig::default();
        config.ease.min_ease = 3.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut config = SchedulerConfig::default();
        config.interval.max_efficiency_multiplier = f64::NAN;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: interval.max_efficiency_multiplier must be finite, got NaN"
        );

        let mut config = SchedulerConfig::default();
        config.analysis.target_minutes = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_inverted_efficiency_multiplier_rejected() {
        let mut config = SchedulerConfig::default();
        config.interval.min_efficiency_multiplier = 2.0;
        config.interval.max_efficiency_multiplier = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ this is not valid json }}").unwrap();

        let result = SchedulerConfig::from_json_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_rejected() {
        let result = SchedulerConfig::from_json_file("nonexistent_config_xyz123.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
