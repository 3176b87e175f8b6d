//! Sequential (first-order Markov) detector.
//!
//! Counts day-to-day transitions between consecutive data-bearing days: every
//! number drawn on day i is paired with every number drawn on day i+1. Rows
//! are smoothed and normalized into probabilities, then the rows of recently
//! drawn numbers are searched for destinations well above the row mean.

use std::collections::BTreeSet;

use quiniela_core::config::DetectionConfig;
use quiniela_core::errors::DetectionError;
use quiniela_core::types::{PatternKind, NUMBER_COUNT};

use super::{DetectionOutcome, Detector, DetectorReport, DrawHistory, MatrixStats};
use crate::patterns::{DetectedPattern, DetectedScore, PatternParams, PatternSignature, ScoreDetails};
use crate::stats;

/// Flag destinations above mean + this many standard deviations.
const STD_MULTIPLIER: f64 = 1.5;
/// The threshold itself must exceed the row mean by this factor.
const MIN_THRESHOLD_RATIO: f64 = 1.2;

/// 100×100 transition counts and their smoothed, row-normalized probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    counts: Vec<u32>,
    probabilities: Vec<f64>,
}

impl TransitionMatrix {
    /// Build from consecutive data-bearing days with additive `smoothing`.
    pub fn build(history: &DrawHistory, smoothing: f64) -> Self {
        let mut counts = vec![0u32; NUMBER_COUNT * NUMBER_COUNT];
        for pair in history.days().windows(2) {
            for &from in &pair[0].numbers {
                for &to in &pair[1].numbers {
                    counts[index(from, to)] += 1;
                }
            }
        }

        let mut probabilities = vec![0.0; NUMBER_COUNT * NUMBER_COUNT];
        for from in 0..NUMBER_COUNT {
            let row = &counts[from * NUMBER_COUNT..(from + 1) * NUMBER_COUNT];
            let total: f64 = row.iter().map(|&c| f64::from(c) + smoothing).sum();
            if total > 0.0 {
                for (to, &c) in row.iter().enumerate() {
                    probabilities[from * NUMBER_COUNT + to] = (f64::from(c) + smoothing) / total;
                }
            }
        }

        Self {
            counts,
            probabilities,
        }
    }

    /// Probabilities out of `from`.
    pub fn row(&self, from: u8) -> &[f64] {
        let start = usize::from(from) * NUMBER_COUNT;
        &self.probabilities[start..start + NUMBER_COUNT]
    }

    /// Raw transition count.
    pub fn count(&self, from: u8, to: u8) -> u32 {
        self.counts[index(from, to)]
    }

    /// Cells of `from`'s row with at least one observed transition.
    pub fn observed_in_row(&self, from: u8) -> usize {
        let start = usize::from(from) * NUMBER_COUNT;
        self.counts[start..start + NUMBER_COUNT]
            .iter()
            .filter(|&&c| c > 0)
            .count()
    }

    pub fn stats(&self) -> MatrixStats {
        MatrixStats {
            non_zero_transitions: self.counts.iter().filter(|&&c| c > 0).count(),
            total_possible_transitions: NUMBER_COUNT * NUMBER_COUNT,
        }
    }
}

fn index(from: u8, to: u8) -> usize {
    usize::from(from) * NUMBER_COUNT + usize::from(to)
}

/// Finds numbers that follow recently drawn numbers unusually often.
#[derive(Debug, Clone)]
pub struct SequentialDetector {
    min_draws: usize,
    smoothing: f64,
    context_days: usize,
}

impl SequentialDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_draws: config.effective_sequential_min_draws(),
            smoothing: config.effective_markov_smoothing(),
            context_days: config.effective_context_days(),
        }
    }

    fn pattern_for_row(&self, matrix: &TransitionMatrix, from: u8) -> Option<DetectedPattern> {
        let row = matrix.row(from);
        let mean = stats::mean(row);
        let std = stats::population_std(row);
        let threshold = mean + STD_MULTIPLIER * std;
        if threshold <= mean * MIN_THRESHOLD_RATIO {
            return None;
        }

        let flagged: Vec<(u8, f64)> = row
            .iter()
            .enumerate()
            .filter(|(_, &p)| p > threshold)
            .map(|(to, &p)| (to as u8, p))
            .collect();
        if flagged.is_empty() {
            return None;
        }

        let scores = flagged
            .iter()
            .map(|&(to, p)| {
                let z = if std > 0.0 { (p - mean) / std } else { 0.0 };
                DetectedScore {
                    number: to,
                    score: (p * 100.0).clamp(0.0, 100.0),
                    confidence: (0.3 + 0.1 * z).clamp(0.0, 0.9),
                    details: ScoreDetails::Transition {
                        from_number: from,
                        transition_probability: p,
                        z_score: z,
                    },
                    reasoning: format!("High transition probability from {from} (p={p:.3})"),
                }
            })
            .collect();

        let strength = stats::mean(&flagged.iter().map(|&(_, p)| p).collect::<Vec<_>>());
        Some(DetectedPattern {
            signature: PatternSignature::MarkovTransition { from_number: from },
            params: PatternParams::MarkovTransition {
                threshold,
                mean_prob: mean,
                std_prob: std,
                transition_count: flagged.len(),
            },
            strength: strength.clamp(0.0, 1.0),
            support: 100 * matrix.observed_in_row(from) as u64,
            scores,
        })
    }
}

impl Default for SequentialDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl Detector for SequentialDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Sequential
    }

    fn min_draws(&self) -> usize {
        self.min_draws
    }

    fn detect(&self, history: &DrawHistory) -> Result<DetectionOutcome, DetectionError> {
        if let Some(short) = DetectionOutcome::check_minimum(history, self.min_draws) {
            return Ok(short);
        }

        let matrix = TransitionMatrix::build(history, self.smoothing);
        let context: BTreeSet<u8> = history
            .last_days(self.context_days)
            .iter()
            .flat_map(|day| day.numbers.iter().copied())
            .collect();

        let patterns: Vec<DetectedPattern> = context
            .into_iter()
            .filter_map(|from| self.pattern_for_row(&matrix, from))
            .collect();

        tracing::debug!(
            patterns = patterns.len(),
            non_zero = matrix.stats().non_zero_transitions,
            "sequential detection finished"
        );

        Ok(DetectionOutcome::Detected(DetectorReport {
            kind: PatternKind::Sequential,
            patterns,
            matrix_stats: Some(matrix.stats()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};
    use proptest::prelude::*;
    use quiniela_core::types::Draw;

    use super::*;

    fn history_from(days: &[Vec<u8>]) -> DrawHistory {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let draws: Vec<Draw> = days
            .iter()
            .enumerate()
            .flat_map(|(i, numbers)| {
                let date = start + Days::new(i as u64);
                numbers
                    .iter()
                    .enumerate()
                    .map(move |(pos, &n)| Draw::new(date, n, pos as u8 + 1).unwrap())
            })
            .collect();
        DrawHistory::from_draws(&draws)
    }

    #[test]
    fn counts_every_pair_between_consecutive_days() {
        let history = history_from(&[vec![1, 2], vec![3, 4], vec![1]]);
        let matrix = TransitionMatrix::build(&history, 0.01);
        assert_eq!(matrix.count(1, 3), 1);
        assert_eq!(matrix.count(2, 4), 1);
        assert_eq!(matrix.count(4, 1), 1);
        assert_eq!(matrix.count(1, 1), 0);
        assert_eq!(matrix.stats().non_zero_transitions, 6);
    }

    #[test]
    fn too_few_draws_is_insufficient_data() {
        let history = history_from(&[vec![1, 2, 3], vec![4, 5, 6]]);
        let outcome = SequentialDetector::default().detect(&history).unwrap();
        assert_eq!(
            outcome,
            DetectionOutcome::InsufficientData {
                required: 100,
                available: 6
            }
        );
    }

    #[test]
    fn repeated_follow_up_is_flagged() {
        // 5 is always followed by 17 the next day; other numbers rotate.
        let days: Vec<Vec<u8>> = (0..60u8)
            .map(|i| {
                if i % 2 == 0 {
                    vec![5, 20 + (i % 30), 60 + (i % 30)]
                } else {
                    vec![17, 21 + (i % 29), 61 + (i % 29)]
                }
            })
            .collect();
        let history = history_from(&days);

        let outcome = SequentialDetector::default().detect(&history).unwrap();
        let pattern = outcome
            .patterns()
            .iter()
            .find(|p| p.signature == PatternSignature::MarkovTransition { from_number: 5 })
            .expect("transition out of 5 should be flagged");

        let top = pattern
            .scores
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .unwrap();
        assert_eq!(top.number, 17);
        assert!(top.confidence <= 0.9);
        assert!(pattern.strength > 0.0 && pattern.strength <= 1.0);
    }

    proptest! {
        #[test]
        fn rows_sum_to_one(
            days in prop::collection::vec(prop::collection::vec(0u8..100, 1..4), 2..40),
            smoothing in 0.001f64..1.0,
        ) {
            let history = history_from(&days);
            let matrix = TransitionMatrix::build(&history, smoothing);
            for from in 0..100u8 {
                let sum: f64 = matrix.row(from).iter().sum();
                prop_assert!((sum - 1.0).abs() < 1e-9, "row {} sums to {}", from, sum);
            }
        }
    }
}
