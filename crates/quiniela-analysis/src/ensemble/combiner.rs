//! Weighted combination of validated component outputs.

use serde::Serialize;

use super::strategy::ComponentWeights;
use crate::scoring::{ComponentKind, ComponentOutput};

/// One component's input to a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentScore {
    pub kind: ComponentKind,
    pub score: f64,
    pub confidence: f64,
    pub weight: f64,
}

/// A number with its combined score before ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub number: u8,
    /// In [0, 100].
    pub score: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub components: Vec<ComponentScore>,
}

/// Combine outputs under `weights`.
///
/// A number's score is the weighted sum of the component scores it received,
/// so a number backed by several components outranks one backed by a single
/// component with a similar score. Confidence is the weighted average over
/// the components that produced the number. Numbers no weighted component
/// produced are omitted.
pub fn combine(outputs: &[&ComponentOutput], weights: &ComponentWeights) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for number in 0..quiniela_core::types::NUMBER_COUNT as u8 {
        let components: Vec<ComponentScore> = outputs
            .iter()
            .filter_map(|output| {
                let weight = weights.get(output.kind);
                let result = output.result_for(number)?;
                (weight > 0.0).then(|| ComponentScore {
                    kind: output.kind,
                    score: result.score,
                    confidence: result.confidence,
                    weight,
                })
            })
            .collect();
        let weight_sum: f64 = components.iter().map(|c| c.weight).sum();
        if components.is_empty() || weight_sum <= 0.0 {
            continue;
        }
        let score: f64 = components.iter().map(|c| c.score * c.weight).sum();
        let confidence = components.iter().map(|c| c.confidence * c.weight).sum::<f64>() / weight_sum;
        candidates.push(Candidate {
            number,
            score: score.clamp(0.0, 100.0),
            confidence: confidence.clamp(0.0, 1.0),
            components,
        });
    }
    candidates
}

/// Candidates at or above `threshold`, best score first, at most `count`.
pub fn rank(candidates: &[Candidate], threshold: f64, count: usize) -> Vec<Candidate> {
    let mut passing: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.confidence >= threshold)
        .cloned()
        .collect();
    sort_best_first(&mut passing);
    passing.truncate(count);
    passing
}

pub(crate) fn sort_best_first(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.confidence.total_cmp(&a.confidence))
            .then(a.number.cmp(&b.number))
    });
}
