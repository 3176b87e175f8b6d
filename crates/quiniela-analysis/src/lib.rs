//! # quiniela-analysis
//!
//! Statistical pattern detection over draw history, the batch-versioned
//! pattern engine, the four per-number scoring components, and the ensemble
//! service that turns them into ranked predictions.

pub mod detectors;
pub mod engine;
pub mod ensemble;
pub mod patterns;
pub mod scoring;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use detectors::{DetectionOutcome, Detector, DrawHistory};
pub use engine::{DetectionReport, PatternEngine, ScoreReport};
pub use ensemble::{PredictionOutcome, PredictionService, Strategy};
