//! Correlation detector: numbers that share draw dates more than chance.

use std::collections::BTreeSet;

use quiniela_core::config::DetectionConfig;
use quiniela_core::errors::DetectionError;
use quiniela_core::types::{PatternKind, NUMBER_COUNT};
use rustc_hash::FxHashMap;

use super::{DetectionOutcome, Detector, DetectorReport, DrawHistory};
use crate::patterns::{DetectedPattern, DetectedScore, PatternParams, PatternSignature, ScoreDetails};
use crate::stats;

/// 1-dof chi-square critical value at p = 0.05.
const CHI_SQUARE_CRITICAL: f64 = 3.84;

/// Measured co-occurrence of one pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairStatistics {
    pub joint: u32,
    pub pmi: f64,
    pub chi_square: f64,
}

/// Finds pairs of numbers that are drawn on the same date unusually often.
#[derive(Debug, Clone)]
pub struct CorrelationDetector {
    min_draws: usize,
    min_pmi: f64,
    min_joint: u32,
}

impl CorrelationDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_draws: config.effective_correlation_min_draws(),
            min_pmi: config.effective_min_pmi(),
            min_joint: config.effective_min_joint_count(),
        }
    }

    /// Marginal day counts per number and joint day counts per ordered pair.
    fn co_occurrence(history: &DrawHistory) -> ([u32; NUMBER_COUNT], FxHashMap<(u8, u8), u32>) {
        let mut marginal = [0u32; NUMBER_COUNT];
        let mut joint: FxHashMap<(u8, u8), u32> = FxHashMap::default();
        for day in history.days() {
            let distinct: Vec<u8> = day.numbers.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
            for (i, &a) in distinct.iter().enumerate() {
                marginal[usize::from(a)] += 1;
                for &b in &distinct[i + 1..] {
                    *joint.entry((a, b)).or_insert(0) += 1;
                }
            }
        }
        (marginal, joint)
    }

    /// PMI and chi-square of a pair; `None` when the marginals are empty.
    pub fn pair_statistics(joint: u32, first: u32, second: u32, days: u32) -> Option<PairStatistics> {
        if days == 0 || first == 0 || second == 0 {
            return None;
        }
        let n = f64::from(days);
        let p_joint = f64::from(joint) / n;
        let p1 = f64::from(first) / n;
        let p2 = f64::from(second) / n;
        let pmi = (p_joint / (p1 * p2)).ln();
        let expected = p1 * p2 * n;
        let chi_square = if expected > 0.0 {
            (f64::from(joint) - expected).powi(2) / expected
        } else {
            0.0
        };
        Some(PairStatistics {
            joint,
            pmi,
            chi_square,
        })
    }

    fn pattern_for_pair(a: u8, b: u8, pair: PairStatistics) -> DetectedPattern {
        let strength = (pair.pmi / 2.0).min(1.0);
        let scores = [(a, b), (b, a)]
            .into_iter()
            .map(|(target, partner)| DetectedScore {
                number: target,
                score: strength * 35.0,
                confidence: (0.4 + 0.35 * strength).min(0.75),
                details: ScoreDetails::Correlation {
                    correlated_with: partner,
                    pmi: pair.pmi,
                    joint_count: pair.joint,
                    chi_square: pair.chi_square,
                },
                reasoning: format!("Correlated with {partner} (PMI={:.2})", pair.pmi),
            })
            .collect();

        DetectedPattern {
            signature: PatternSignature::correlation(a, b),
            params: PatternParams::NumberCorrelation {
                pmi: pair.pmi,
                chi_square: pair.chi_square,
                p_value: stats::chi_square_p_value(pair.chi_square),
                joint_count: pair.joint,
            },
            strength,
            support: u64::from(pair.joint),
            scores,
        }
    }
}

impl Default for CorrelationDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl Detector for CorrelationDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Correlation
    }

    fn min_draws(&self) -> usize {
        self.min_draws
    }

    fn detect(&self, history: &DrawHistory) -> Result<DetectionOutcome, DetectionError> {
        if let Some(short) = DetectionOutcome::check_minimum(history, self.min_draws) {
            return Ok(short);
        }

        let days = history.day_count() as u32;
        let (marginal, joint) = Self::co_occurrence(history);

        let mut patterns: Vec<DetectedPattern> = joint
            .into_iter()
            .filter(|&(_, count)| count >= self.min_joint)
            .filter_map(|((a, b), count)| {
                let pair = Self::pair_statistics(
                    count,
                    marginal[usize::from(a)],
                    marginal[usize::from(b)],
                    days,
                )?;
                (pair.pmi > self.min_pmi && pair.chi_square > CHI_SQUARE_CRITICAL)
                    .then(|| Self::pattern_for_pair(a, b, pair))
            })
            .collect();
        patterns.sort_by(|x, y| {
            y.strength
                .total_cmp(&x.strength)
                .then_with(|| x.support.cmp(&y.support).reverse())
        });

        tracing::debug!(pairs = patterns.len(), days, "correlation detection finished");
        Ok(DetectionOutcome::Detected(DetectorReport {
            kind: PatternKind::Correlation,
            patterns,
            matrix_stats: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_pair_has_zero_pmi() {
        // 100 days, each number on 50, together on 25: exactly independent.
        let stats = CorrelationDetector::pair_statistics(25, 50, 50, 100).unwrap();
        assert!(stats.pmi.abs() < 1e-12);
        assert!(stats.chi_square.abs() < 1e-12);
    }

    #[test]
    fn strong_pair_exceeds_both_thresholds() {
        let stats = CorrelationDetector::pair_statistics(32, 40, 40, 200).unwrap();
        assert!((stats.pmi - 4f64.ln()).abs() < 1e-12);
        assert!((stats.chi_square - 72.0).abs() < 1e-9);
    }

    #[test]
    fn empty_marginal_has_no_statistics() {
        assert!(CorrelationDetector::pair_statistics(0, 0, 10, 100).is_none());
    }

    #[test]
    fn both_numbers_score_and_name_their_partner() {
        let pair = CorrelationDetector::pair_statistics(32, 40, 40, 200).unwrap();
        let pattern = CorrelationDetector::pattern_for_pair(3, 8, pair);
        assert_eq!(pattern.scores.len(), 2);
        assert!(pattern.scores[0].reasoning.contains('8'));
        assert!(pattern.scores[1].reasoning.contains('3'));
        assert!((pattern.strength - (4f64.ln() / 2.0)).abs() < 1e-12);
    }
}
