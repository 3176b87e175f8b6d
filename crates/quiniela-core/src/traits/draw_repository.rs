//! Read/write access to historical draws.

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::StorageError;
use crate::types::{Draw, NumberFrequency, SaveOutcome};

/// Historical draw access.
pub trait DrawRepository: Send + Sync {
    /// Draws with `start <= date <= end`, ordered by date then position.
    fn get_draws_in_period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Draw>, StorageError>;

    /// Per-number counts for dates from `as_of - days` through `as_of`.
    ///
    /// `relative` is the count divided by the number of distinct draw dates in
    /// the window. Numbers that never appeared are omitted. Empty when the
    /// window holds no draws.
    fn get_all_numbers_frequency(
        &self,
        days: u32,
        as_of: NaiveDate,
    ) -> Result<Vec<NumberFrequency>, StorageError>;

    /// Distinct draw dates from `as_of - days` through `as_of`.
    fn count_draw_days(&self, days: u32, as_of: NaiveDate) -> Result<u32, StorageError>;

    /// Insert a draw. Idempotent on (date, number, position).
    fn save_draw(&self, draw: &Draw) -> Result<SaveOutcome, StorageError>;

    /// Most recent draws, newest first.
    fn get_recent_draws(&self, limit: usize) -> Result<Vec<Draw>, StorageError>;

    /// Days spanned between the oldest and newest stored draw, inclusive.
    fn data_coverage_days(&self) -> Result<u32, StorageError>;

    /// Timestamp of the last successful insert, if any.
    fn last_update(&self) -> Result<Option<DateTime<Utc>>, StorageError>;
}
