//! Stable error codes shared by every subsystem error.

/// Structured error code for callers that cannot match on Rust enums
/// (dashboards, log pipelines).
pub trait QuinielaErrorCode {
    /// Returns the error code string (e.g., "STORAGE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns `[ERROR_CODE] message`.
    fn tagged_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const INVALID_RECORD: &str = "INVALID_RECORD";
pub const DETECTION_ERROR: &str = "DETECTION_ERROR";
pub const SCORING_ERROR: &str = "SCORING_ERROR";
pub const ENGINE_ERROR: &str = "ENGINE_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
