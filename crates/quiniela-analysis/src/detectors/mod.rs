//! Pattern detectors.
//!
//! Each detector consumes a `DrawHistory` and returns either the patterns it
//! found or an explicit insufficient-data marker. Detectors never touch
//! storage; the engine loads history and persists results.

pub mod correlation;
pub mod cyclical;
pub mod history;
pub mod sequential;

pub use correlation::CorrelationDetector;
pub use cyclical::CyclicalDetector;
pub use history::{DrawDay, DrawHistory};
pub use sequential::{SequentialDetector, TransitionMatrix};

use quiniela_core::errors::DetectionError;
use quiniela_core::types::PatternKind;
use serde::Serialize;

use crate::patterns::DetectedPattern;

/// A statistical pattern detector.
pub trait Detector: Send + Sync {
    fn kind(&self) -> PatternKind;

    /// Draw records required before `detect` will look for structure.
    fn min_draws(&self) -> usize;

    fn detect(&self, history: &DrawHistory) -> Result<DetectionOutcome, DetectionError>;
}

/// Result of one detector run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionOutcome {
    Detected(DetectorReport),
    InsufficientData { required: usize, available: usize },
}

impl DetectionOutcome {
    /// Insufficient-data marker when `history` is below `required`.
    pub fn check_minimum(history: &DrawHistory, required: usize) -> Option<Self> {
        let available = history.draw_count();
        (available < required).then_some(Self::InsufficientData {
            required,
            available,
        })
    }

    pub fn patterns(&self) -> &[DetectedPattern] {
        match self {
            Self::Detected(report) => &report.patterns,
            Self::InsufficientData { .. } => &[],
        }
    }
}

/// Patterns found by one detector plus detector-specific statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorReport {
    pub kind: PatternKind,
    pub patterns: Vec<DetectedPattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix_stats: Option<MatrixStats>,
}

/// Sparsity of the raw transition counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixStats {
    pub non_zero_transitions: usize,
    pub total_possible_transitions: usize,
}
