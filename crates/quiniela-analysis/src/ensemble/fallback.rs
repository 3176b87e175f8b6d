//! Last-resort rankings used when the weighted ensemble has nothing to offer.

use quiniela_core::types::NUMBER_COUNT;

use super::combiner::{sort_best_first, Candidate, ComponentScore};
use crate::scoring::ComponentOutput;

/// Frequency output ranked on its own, ignoring the confidence threshold.
pub fn frequency_only(output: &ComponentOutput, count: usize) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = output
        .results
        .iter()
        .map(|r| Candidate {
            number: r.number,
            score: r.score,
            confidence: r.confidence,
            components: vec![ComponentScore {
                kind: output.kind,
                score: r.score,
                confidence: r.confidence,
                weight: 1.0,
            }],
        })
        .collect();
    sort_best_first(&mut candidates);
    candidates.truncate(count);
    candidates
}

/// Evenly spaced numbers with the uniform probability as score and no confidence.
pub fn uniform_sample(count: usize) -> Vec<Candidate> {
    let count = count.min(NUMBER_COUNT);
    if count == 0 {
        return Vec::new();
    }
    let uniform = 100.0 / NUMBER_COUNT as f64;
    (0..count)
        .map(|i| Candidate {
            number: (i * NUMBER_COUNT / count) as u8,
            score: uniform,
            confidence: 0.0,
            components: Vec::new(),
        })
        .collect()
}
