//! Retention cleanup for draw history.
//!
//! Pattern tables are self-bounding: rows are keyed by (kind, signature,
//! window) and refreshed in place, so only draws need time-based cleanup.

use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use quiniela_core::errors::StorageError;

use crate::queries::draws;

/// Report of what was cleaned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetentionReport {
    pub cutoff: Option<NaiveDate>,
    pub draws_deleted: u64,
    pub duration_ms: u64,
}

/// Delete draws dated more than `retention_days` before `today`.
///
/// Runs in one transaction.
pub fn apply_retention(
    conn: &Connection,
    retention_days: u32,
    today: NaiveDate,
) -> Result<RetentionReport, StorageError> {
    let start = std::time::Instant::now();
    let cutoff = today
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN);

    let tx = conn.unchecked_transaction().map_err(|e| StorageError::SqliteError {
        message: format!("retention begin: {e}"),
    })?;
    let deleted = draws::delete_draws_before(&tx, cutoff)?;
    tx.commit().map_err(StorageError::sqlite)?;

    let report = RetentionReport {
        cutoff: Some(cutoff),
        draws_deleted: deleted as u64,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    tracing::info!(
        cutoff = %cutoff,
        draws_deleted = report.draws_deleted,
        "applied draw retention"
    );
    Ok(report)
}
