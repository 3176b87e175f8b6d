//! Structured field names used in tracing spans and events.

/// Detector run time in milliseconds.
pub const DETECTION_TIME_MS: &str = "detection_time_ms";

/// Patterns persisted in one batch.
pub const PATTERNS_PERSISTED: &str = "patterns_persisted";

/// Patterns skipped because persistence failed.
pub const PATTERNS_FAILED: &str = "patterns_failed";

/// Aggregation cache hit (true/false).
pub const AGGREGATION_CACHE_HIT: &str = "aggregation_cache_hit";

/// Prediction memo cache hit (true/false).
pub const PREDICTION_CACHE_HIT: &str = "prediction_cache_hit";

/// Age in seconds of the batch used for scoring.
pub const BATCH_AGE_SECS: &str = "batch_age_secs";

/// Components that passed validation in an ensemble run.
pub const ACTIVE_COMPONENTS: &str = "active_components";
