//! Storage errors.

use super::error_code::{self, QuinielaErrorCode};

/// Errors raised by the SQLite persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration v{version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl StorageError {
    pub fn sqlite(e: impl std::fmt::Display) -> Self {
        Self::SqliteError {
            message: e.to_string(),
        }
    }
}

impl QuinielaErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::InvalidRecord { .. } => error_code::INVALID_RECORD,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
