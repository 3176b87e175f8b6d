//! Prediction outcome types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::combiner::{Candidate, ComponentScore};
use super::quality::DataQuality;
use super::strategy::Strategy;
use crate::scoring::{ComponentKind, ComponentStatus};
use crate::stats;

/// Coarse confidence bucket shown alongside each prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.6 {
            Self::Medium
        } else if confidence >= 0.4 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Moderate => "moderate",
            Self::Low => "low",
        }
    }
}

/// How the predictions were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Enough candidates passed the requested threshold.
    Ok,
    /// Too few passed; the threshold was relaxed once.
    Relaxed,
    /// The weighted ensemble produced nothing; frequency alone ranked the numbers.
    FrequencyFallback,
    /// No usable signal; an unweighted sample is returned.
    InsufficientData,
}

/// One ranked number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// 1-based.
    pub rank: usize,
    pub number: u8,
    pub score: f64,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub components: Vec<ComponentScore>,
    pub reasoning: String,
}

impl Prediction {
    pub(crate) fn from_candidate(rank: usize, candidate: Candidate, status: OutcomeStatus) -> Self {
        let confidence_level = ConfidenceLevel::from_confidence(candidate.confidence);
        let reasoning = reasoning(&candidate, confidence_level, status);
        Self {
            rank,
            number: candidate.number,
            score: candidate.score,
            confidence: candidate.confidence,
            confidence_level,
            components: candidate.components,
            reasoning,
        }
    }

    pub fn contributing(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.iter().map(|c| c.kind)
    }
}

fn reasoning(candidate: &Candidate, level: ConfidenceLevel, status: OutcomeStatus) -> String {
    let signals = candidate
        .components
        .iter()
        .map(|c| format!("{} {:.1}", c.kind, c.score))
        .collect::<Vec<_>>()
        .join(", ");
    match status {
        OutcomeStatus::InsufficientData => {
            "uniform sample: not enough history for any signal".to_string()
        }
        OutcomeStatus::FrequencyFallback => format!(
            "frequency-only fallback ({signals}), {} confidence {:.2}",
            level.name(),
            candidate.confidence
        ),
        OutcomeStatus::Ok | OutcomeStatus::Relaxed => format!(
            "score {:.1} from {signals}; {} confidence {:.2}",
            candidate.score,
            level.name(),
            candidate.confidence
        ),
    }
}

/// Per-component diagnostics for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    pub kind: ComponentKind,
    pub status: ComponentStatus,
    /// Set when the component served a fallback signal.
    pub degraded: bool,
    pub quality: DataQuality,
    pub base_weight: f64,
    /// Zero for components that were not used.
    pub adjusted_weight: f64,
    pub numbers_found: usize,
    pub numbers_in_predictions: usize,
    /// Share of the predictions this component contributed to.
    pub effectiveness: f64,
}

/// Summary of the returned predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionStatistics {
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub median_score: f64,
    pub mean_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub confidence_distribution: BTreeMap<ConfidenceLevel, usize>,
}

impl PredictionStatistics {
    pub fn from_predictions(predictions: &[Prediction]) -> Self {
        if predictions.is_empty() {
            return Self::default();
        }
        let scores: Vec<f64> = predictions.iter().map(|p| p.score).collect();
        let confidences: Vec<f64> = predictions.iter().map(|p| p.confidence).collect();
        let mut confidence_distribution = BTreeMap::new();
        for p in predictions {
            *confidence_distribution.entry(p.confidence_level).or_insert(0) += 1;
        }
        Self {
            mean_score: stats::mean(&scores),
            min_score: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max_score: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            median_score: stats::median(&scores),
            mean_confidence: stats::mean(&confidences),
            min_confidence: confidences.iter().copied().fold(f64::INFINITY, f64::min),
            max_confidence: confidences.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            confidence_distribution,
        }
    }
}

/// Result of `PredictionService::generate_predictions`. Never an error:
/// degraded paths are reported through `status` and `notes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub strategy: Strategy,
    pub window_days: u32,
    pub as_of: NaiveDate,
    pub requested_count: usize,
    pub requested_threshold: f64,
    /// Threshold the returned predictions actually satisfy; `None` for fallbacks.
    pub applied_threshold: Option<f64>,
    pub status: OutcomeStatus,
    pub predictions: Vec<Prediction>,
    pub components: Vec<ComponentReport>,
    pub statistics: PredictionStatistics,
    /// Age of the pattern batch behind the pattern component, if any.
    pub pattern_batch_age_secs: Option<i64>,
    pub notes: Vec<String>,
}

impl PredictionOutcome {
    pub fn numbers(&self) -> Vec<u8> {
        self.predictions.iter().map(|p| p.number).collect()
    }

    pub fn component(&self, kind: ComponentKind) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_level_boundaries() {
        assert_eq!(ConfidenceLevel::from_confidence(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.79), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.4), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_confidence(0.39), ConfidenceLevel::Low);
    }

    #[test]
    fn statistics_cover_scores_and_levels() {
        let predictions: Vec<Prediction> = [(10.0, 0.9), (30.0, 0.5), (20.0, 0.5)]
            .iter()
            .enumerate()
            .map(|(i, &(score, confidence))| {
                Prediction::from_candidate(
                    i + 1,
                    Candidate {
                        number: i as u8,
                        score,
                        confidence,
                        components: Vec::new(),
                    },
                    OutcomeStatus::Ok,
                )
            })
            .collect();
        let stats = PredictionStatistics::from_predictions(&predictions);
        assert_eq!(stats.min_score, 10.0);
        assert_eq!(stats.max_score, 30.0);
        assert_eq!(stats.median_score, 20.0);
        assert_eq!(stats.confidence_distribution[&ConfidenceLevel::Moderate], 2);
        assert_eq!(stats.confidence_distribution[&ConfidenceLevel::High], 1);
    }
}
