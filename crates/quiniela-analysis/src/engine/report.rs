//! Detection and scoring reports.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use quiniela_core::types::{PatternKind, NUMBER_COUNT};
use serde::Serialize;

use crate::detectors::MatrixStats;
use crate::patterns::{DetectedPattern, PatternSignature};

/// How one detector fared within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectorRunResult {
    Detected {
        patterns: Vec<DetectedPattern>,
        persisted: usize,
        failed: usize,
        superseded: usize,
        /// Set when older generations could not be deactivated, leaving
        /// more than one generation of this kind active.
        #[serde(skip_serializing_if = "Option::is_none")]
        supersede_error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        matrix_stats: Option<MatrixStats>,
    },
    InsufficientData {
        required: usize,
        available: usize,
    },
    Failed {
        message: String,
    },
}

/// One detector's entry in a `DetectionReport`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorRun {
    pub kind: PatternKind,
    pub duration_ms: u64,
    pub result: DetectorRunResult,
}

/// Totals across every detector of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_patterns: usize,
    pub patterns_by_kind: BTreeMap<PatternKind, usize>,
    pub average_strength: f64,
    pub total_support: u64,
}

impl SummaryStats {
    pub fn from_runs(runs: &[DetectorRun]) -> Self {
        let mut summary = Self::default();
        let mut strength_sum = 0.0;
        for run in runs {
            if let DetectorRunResult::Detected { patterns, .. } = &run.result {
                summary.patterns_by_kind.insert(run.kind, patterns.len());
                summary.total_patterns += patterns.len();
                for p in patterns {
                    strength_sum += p.strength;
                    summary.total_support += p.support;
                }
            }
        }
        if summary.total_patterns > 0 {
            summary.average_strength = strength_sum / summary.total_patterns as f64;
        }
        summary
    }
}

/// Result of `PatternEngine::compute_patterns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub batch_id: String,
    pub window_days: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub draws_analyzed: usize,
    /// Patterns of this window deactivated for age before the batch ran.
    pub stale_deactivated: usize,
    pub runs: Vec<DetectorRun>,
    pub summary: SummaryStats,
}

impl DetectionReport {
    pub fn run(&self, kind: PatternKind) -> Option<&DetectorRun> {
        self.runs.iter().find(|r| r.kind == kind)
    }

    pub fn persisted(&self) -> usize {
        self.runs
            .iter()
            .map(|r| match r.result {
                DetectorRunResult::Detected { persisted, .. } => persisted,
                _ => 0,
            })
            .sum()
    }

    /// Kinds whose older generations are still active after this batch.
    pub fn unsuperseded(&self) -> Vec<PatternKind> {
        self.runs
            .iter()
            .filter(|r| {
                matches!(
                    r.result,
                    DetectorRunResult::Detected {
                        supersede_error: Some(_),
                        ..
                    }
                )
            })
            .map(|r| r.kind)
            .collect()
    }

    pub fn failed(&self) -> usize {
        self.runs
            .iter()
            .map(|r| match r.result {
                DetectorRunResult::Detected { failed, .. } => failed,
                _ => 0,
            })
            .sum()
    }
}

/// One stored pattern's share of a number's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternContribution {
    pub pattern_id: i64,
    pub kind: PatternKind,
    pub signature: PatternSignature,
    /// Aggregation weight of the pattern.
    pub weight: f64,
    /// Stored per-number score before weighting.
    pub score: f64,
    pub confidence: f64,
    /// `score * weight`, before rescaling.
    pub contribution: f64,
    pub reasoning: String,
}

/// Aggregated pattern score for one number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberScore {
    pub number: u8,
    /// In [0, 100]; the best-scoring number is 100 when any pattern applies.
    pub score: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub contributions: Vec<PatternContribution>,
}

impl NumberScore {
    fn empty(number: u8) -> Self {
        Self {
            number,
            score: 0.0,
            confidence: 0.0,
            contributions: Vec::new(),
        }
    }

    /// Contributions grouped by pattern kind.
    pub fn details_by_kind(&self) -> BTreeMap<PatternKind, Vec<&PatternContribution>> {
        let mut grouped: BTreeMap<PatternKind, Vec<&PatternContribution>> = BTreeMap::new();
        for c in &self.contributions {
            grouped.entry(c.kind).or_default().push(c);
        }
        grouped
    }
}

/// Cached aggregation of one window's newest batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub batch_id: Option<String>,
    /// Unix seconds of the batch's newest update.
    pub batch_updated_at: Option<i64>,
    pub patterns_used: usize,
    /// Indexed by number.
    pub scores: Vec<NumberScore>,
}

impl Aggregation {
    pub fn empty() -> Self {
        Self {
            batch_id: None,
            batch_updated_at: None,
            patterns_used: 0,
            scores: (0..NUMBER_COUNT as u8).map(NumberScore::empty).collect(),
        }
    }

    /// Rescale so the best score is 100 and cap confidences at 1.
    pub(crate) fn normalize(&mut self) {
        let max = self.scores.iter().map(|s| s.score).fold(0.0, f64::max);
        for s in &mut self.scores {
            if max > 0.0 {
                s.score = (s.score / max * 100.0).clamp(0.0, 100.0);
            }
            s.confidence = s.confidence.clamp(0.0, 1.0);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns_used == 0
    }
}

/// Result of `PatternEngine::score_numbers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub window_days: u32,
    pub batch_id: Option<String>,
    /// Seconds since the scored batch was last written; `None` without a batch.
    pub batch_age_secs: Option<i64>,
    /// True when there is no batch or it is older than the staleness limit.
    pub is_stale: bool,
    pub patterns_used: usize,
    /// One entry per number, ordered by number.
    pub scores: Vec<NumberScore>,
}

impl ScoreReport {
    pub fn score_of(&self, number: u8) -> Option<&NumberScore> {
        self.scores.get(usize::from(number))
    }

    /// Numbers with a non-zero score, best first.
    pub fn ranked(&self) -> Vec<&NumberScore> {
        let mut ranked: Vec<&NumberScore> = self.scores.iter().filter(|s| s.score > 0.0).collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.number.cmp(&b.number)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_best_to_hundred() {
        let mut agg = Aggregation::empty();
        agg.scores[3].score = 5.0;
        agg.scores[4].score = 2.5;
        agg.scores[4].confidence = 1.7;
        agg.normalize();

        assert_eq!(agg.scores[3].score, 100.0);
        assert_eq!(agg.scores[4].score, 50.0);
        assert_eq!(agg.scores[4].confidence, 1.0);
        assert_eq!(agg.scores[0].score, 0.0);
    }

    #[test]
    fn empty_aggregation_stays_zero() {
        let mut agg = Aggregation::empty();
        agg.normalize();
        assert!(agg.scores.iter().all(|s| s.score == 0.0));
        assert_eq!(agg.scores.len(), 100);
    }
}
