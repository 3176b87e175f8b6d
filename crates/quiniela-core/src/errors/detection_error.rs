//! Detection errors.

use super::error_code::{self, QuinielaErrorCode};
use super::StorageError;

/// Hard faults during pattern detection.
///
/// Too little history is not an error: detectors report it through
/// `DetectionOutcome::InsufficientData`.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Invalid analysis window: {days} days")]
    InvalidWindow { days: u32 },

    #[error("Failed to load draws: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode pattern {what}: {message}")]
    Encoding { what: &'static str, message: String },
}

impl QuinielaErrorCode for DetectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            _ => error_code::DETECTION_ERROR,
        }
    }
}
