//! Versioned persistence for detected patterns and their per-number scores.

use crate::errors::StorageError;
use crate::types::{
    ActivePatternQuery, BatchInfo, NewPattern, PatternKind, PatternRecord, PatternScoreRecord,
    PersistOutcome, ScorePeriod,
};

/// Pattern store with batch versioning and staleness control.
///
/// Timestamps are unix seconds supplied by the caller.
pub trait PatternRepository: Send + Sync {
    /// Mark active patterns of `window_days` inactive when their last update
    /// is older than `max_age_secs`. Returns the number deactivated.
    fn deactivate_stale_patterns(
        &self,
        window_days: u32,
        max_age_secs: i64,
        now: i64,
    ) -> Result<usize, StorageError>;

    /// Upsert a pattern by (kind, signature, window) and replace all of its
    /// score rows. Pattern row and score rows commit together or not at all.
    fn persist_pattern(
        &self,
        pattern: &NewPattern,
        window_days: u32,
        batch_id: &str,
        period: ScorePeriod,
        now: i64,
    ) -> Result<PersistOutcome, StorageError>;

    /// Deactivate active patterns of (kind, window) that belong to any batch
    /// other than `batch_id`. Returns the number deactivated.
    fn deactivate_superseded(
        &self,
        kind: PatternKind,
        window_days: u32,
        batch_id: &str,
    ) -> Result<usize, StorageError>;

    /// Active patterns matching the query, strongest first, with duplicate
    /// signatures suppressed.
    fn active_patterns(
        &self,
        query: &ActivePatternQuery,
    ) -> Result<Vec<PatternRecord>, StorageError>;

    /// Score rows of one pattern, highest score first.
    fn pattern_scores(&self, pattern_id: i64) -> Result<Vec<PatternScoreRecord>, StorageError>;

    /// Newest active batch for a window, if one exists.
    fn latest_batch(&self, window_days: u32) -> Result<Option<BatchInfo>, StorageError>;
}
