//! Output checks applied before the ensemble trusts a component.

use serde::Serialize;

use super::ComponentOutput;
use crate::stats;

/// Variance at or below this counts as a flat output.
const MIN_SCORE_VARIANCE: f64 = 1e-9;

/// How a component fared for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentStatus {
    Valid,
    /// Output was produced but failed validation.
    Rejected { reason: String },
    /// The component returned an error.
    Failed { message: String },
}

impl ComponentStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Check candidate count, value bounds, and score variance.
pub fn validate(output: &ComponentOutput, min_candidates: usize) -> ComponentStatus {
    if output.len() < min_candidates {
        return ComponentStatus::Rejected {
            reason: format!("{} candidates, need {min_candidates}", output.len()),
        };
    }
    if let Some(r) = output
        .results
        .iter()
        .find(|r| !(0.0..=100.0).contains(&r.score))
    {
        return ComponentStatus::Rejected {
            reason: format!("score {} for number {} out of range", r.score, r.number),
        };
    }
    if let Some(r) = output
        .results
        .iter()
        .find(|r| !(0.0..=1.0).contains(&r.confidence))
    {
        return ComponentStatus::Rejected {
            reason: format!("confidence {} for number {} out of range", r.confidence, r.number),
        };
    }

    let scores: Vec<f64> = output.results.iter().map(|r| r.score).collect();
    if stats::population_std(&scores).powi(2) <= MIN_SCORE_VARIANCE {
        return ComponentStatus::Rejected {
            reason: "all scores are equal".to_string(),
        };
    }
    ComponentStatus::Valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ComponentDetails, ComponentKind, ComponentResult};

    fn output(scores: &[(f64, f64)]) -> ComponentOutput {
        let results = scores
            .iter()
            .enumerate()
            .map(|(i, &(score, confidence))| ComponentResult {
                number: i as u8,
                score,
                confidence,
                details: ComponentDetails::DigitHeuristic {
                    tens_match: false,
                    units_match: false,
                },
            })
            .collect();
        ComponentOutput::new(ComponentKind::Pattern, results)
    }

    fn varied(n: usize) -> Vec<(f64, f64)> {
        (0..n).map(|i| (i as f64, 0.5)).collect()
    }

    #[test]
    fn accepts_varied_output() {
        assert!(validate(&output(&varied(12)), 10).is_valid());
    }

    #[test]
    fn rejects_too_few_candidates() {
        assert!(!validate(&output(&varied(9)), 10).is_valid());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut scores = varied(12);
        scores[3].0 = 140.0;
        assert!(!validate(&output(&scores), 10).is_valid());

        let mut scores = varied(12);
        scores[5].1 = -0.1;
        assert!(!validate(&output(&scores), 10).is_valid());
    }

    #[test]
    fn rejects_flat_scores() {
        let flat = vec![(25.0, 0.5); 20];
        assert_eq!(
            validate(&output(&flat), 10),
            ComponentStatus::Rejected {
                reason: "all scores are equal".to_string()
            }
        );
    }
}
