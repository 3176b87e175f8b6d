//! Pattern engine errors.

use super::error_code::{self, QuinielaErrorCode};
use super::{DetectionError, StorageError};

/// Errors surfaced by the pattern engine orchestration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Invalid analysis window: {days} days")]
    InvalidWindow { days: u32 },

    #[error("Stored pattern {pattern_id} is unreadable: {message}")]
    CorruptPattern { pattern_id: i64, message: String },
}

impl QuinielaErrorCode for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Detection(e) => e.error_code(),
            _ => error_code::ENGINE_ERROR,
        }
    }
}
