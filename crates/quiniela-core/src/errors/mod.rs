//! Error handling for the quiniela engine.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod detection_error;
pub mod engine_error;
pub mod error_code;
pub mod scoring_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use detection_error::DetectionError;
pub use engine_error::EngineError;
pub use error_code::QuinielaErrorCode;
pub use scoring_error::ScoringError;
pub use storage_error::StorageError;
