//! Normalized summary of a learner's recent performance on one concept.
use serde::{Deserialize, Serialize};

/// Direction of self-reported confidence, recent events versus older ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTrend {
    Improving,
    Declining,
    Stable,
}

impl ConfidenceTrend {
    pub fn between(recent: f64, older: f64) -> Self {
        if recent > older {
            ConfidenceTrend::Improving
        } else if recent < older {
            ConfidenceTrend::Declining
        } else {
            ConfidenceTrend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTrend::Improving => "improving",
            ConfidenceTrend::Declining => "declining",
            ConfidenceTrend::Stable => "stable",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
    /// Blended score, 0.1 - 1.0
    pub overall_score: f64,
    pub confidence_trend: ConfidenceTrend,
    /// 0.1 - 2.0, higher is faster
    pub time_efficiency: f64,
    pub recent_correctness: f64,
    pub average_confidence: f64,
    /// Population standard deviation of correctness over the full history
    pub performance_variance: f64,
}

impl Default for PerformanceAnalysis {
    /// The analysis of an empty history.
    fn default() -> Self {
        Self {
            overall_score: 0.5,
            confidence_trend: ConfidenceTrend::Stable,
            time_efficiency: 1.0,
            recent_correctness: 0.5,
            average_confidence: 3.0,
            performance_variance: 0.0,
        }
    }
}
