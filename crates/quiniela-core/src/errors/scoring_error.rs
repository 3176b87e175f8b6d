//! Scoring component errors.

use super::error_code::{self, QuinielaErrorCode};
use super::{EngineError, StorageError};

/// Errors raised by a scoring component while producing its output.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Pattern engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("{component}: not enough data ({message})")]
    NoData {
        component: &'static str,
        message: String,
    },
}

impl QuinielaErrorCode for ScoringError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Engine(e) => e.error_code(),
            Self::NoData { .. } => error_code::SCORING_ERROR,
        }
    }
}
