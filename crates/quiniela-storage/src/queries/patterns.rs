//! Pattern and pattern-score queries.

use quiniela_core::errors::StorageError;
use quiniela_core::types::{
    BatchInfo, NewPattern, NewPatternScore, PatternKind, PatternRecord, PatternScoreRecord,
    PatternStatus, ScorePeriod,
};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

use super::{date_from_row, date_to_sql};

const PATTERN_COLUMNS: &str = "id, kind, signature, window_days, params, strength, support, \
                               status, batch_id, created_at, updated_at";

/// Insert a pattern or refresh the existing (kind, signature, window) row.
///
/// A refreshed row is reactivated and moved to `batch_id`; `created_at` is
/// kept. Returns the row id and whether it already existed.
pub fn upsert_pattern(
    conn: &Connection,
    pattern: &NewPattern,
    window_days: u32,
    batch_id: &str,
    now: i64,
) -> Result<(i64, bool), StorageError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM patterns WHERE kind = ?1 AND signature = ?2 AND window_days = ?3",
            params![pattern.kind.name(), pattern.signature, window_days],
            |row| row.get(0),
        )
        .optional()
        .map_err(StorageError::sqlite)?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE patterns
                 SET params = ?2, strength = ?3, support = ?4, status = 'active',
                     batch_id = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    id,
                    pattern.params,
                    pattern.strength,
                    pattern.support as i64,
                    batch_id,
                    now,
                ],
            )
            .map_err(StorageError::sqlite)?;
            Ok((id, true))
        }
        None => {
            conn.execute(
                "INSERT INTO patterns
                   (kind, signature, window_days, params, strength, support, status,
                    batch_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'active', ?7, ?8, ?8)",
                params![
                    pattern.kind.name(),
                    pattern.signature,
                    window_days,
                    pattern.params,
                    pattern.strength,
                    pattern.support as i64,
                    batch_id,
                    now,
                ],
            )
            .map_err(StorageError::sqlite)?;
            Ok((conn.last_insert_rowid(), false))
        }
    }
}

/// Delete every score row of a pattern and insert `scores` in their place.
pub fn replace_scores(
    conn: &Connection,
    pattern_id: i64,
    batch_id: &str,
    period: ScorePeriod,
    scores: &[NewPatternScore],
) -> Result<usize, StorageError> {
    conn.execute(
        "DELETE FROM pattern_scores WHERE pattern_id = ?1",
        params![pattern_id],
    )
    .map_err(StorageError::sqlite)?;

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO pattern_scores
               (pattern_id, number, score, confidence, period_start, period_end,
                details, reasoning, batch_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (pattern_id, number, period_start, period_end) DO UPDATE SET
               score = excluded.score,
               confidence = excluded.confidence,
               details = excluded.details,
               reasoning = excluded.reasoning,
               batch_id = excluded.batch_id",
        )
        .map_err(StorageError::sqlite)?;

    let start = date_to_sql(period.start);
    let end = date_to_sql(period.end);
    for score in scores {
        stmt.execute(params![
            pattern_id,
            score.number,
            score.score,
            score.confidence,
            start,
            end,
            score.details,
            score.reasoning,
            batch_id,
        ])
        .map_err(StorageError::sqlite)?;
    }
    Ok(scores.len())
}

/// Deactivate active patterns of a window last updated before `cutoff`.
pub fn deactivate_updated_before(
    conn: &Connection,
    window_days: u32,
    cutoff: i64,
) -> Result<usize, StorageError> {
    conn.execute(
        "UPDATE patterns SET status = 'inactive'
         WHERE window_days = ?1 AND status = 'active' AND updated_at < ?2",
        params![window_days, cutoff],
    )
    .map_err(StorageError::sqlite)
}

/// Deactivate active patterns of (kind, window) outside `batch_id`.
pub fn deactivate_other_batches(
    conn: &Connection,
    kind: PatternKind,
    window_days: u32,
    batch_id: &str,
) -> Result<usize, StorageError> {
    conn.execute(
        "UPDATE patterns SET status = 'inactive'
         WHERE kind = ?1 AND window_days = ?2 AND status = 'active' AND batch_id <> ?3",
        params![kind.name(), window_days, batch_id],
    )
    .map_err(StorageError::sqlite)
}

/// Newest batch with active patterns in a window.
pub fn latest_active_batch(
    conn: &Connection,
    window_days: u32,
) -> Result<Option<BatchInfo>, StorageError> {
    conn.query_row(
        "SELECT batch_id, MAX(updated_at) AS last_update, COUNT(*)
         FROM patterns
         WHERE window_days = ?1 AND status = 'active'
         GROUP BY batch_id
         ORDER BY last_update DESC, MAX(id) DESC
         LIMIT 1",
        params![window_days],
        |row| {
            Ok(BatchInfo {
                batch_id: row.get(0)?,
                updated_at: row.get(1)?,
                pattern_count: row.get::<_, i64>(2)?.max(0) as u64,
            })
        },
    )
    .optional()
    .map_err(StorageError::sqlite)
}

/// Active patterns of one batch at or above `min_strength`, strongest first.
pub fn active_patterns_in_batch(
    conn: &Connection,
    window_days: u32,
    batch_id: &str,
    min_strength: f64,
) -> Result<Vec<PatternRecord>, StorageError> {
    let sql = format!(
        "SELECT {PATTERN_COLUMNS} FROM patterns
         WHERE window_days = ?1 AND batch_id = ?2 AND status = 'active' AND strength >= ?3
         ORDER BY strength DESC, id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql).map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![window_days, batch_id, min_strength], map_pattern_row)
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

/// Look up one pattern by id.
pub fn get_pattern(conn: &Connection, id: i64) -> Result<Option<PatternRecord>, StorageError> {
    let sql = format!("SELECT {PATTERN_COLUMNS} FROM patterns WHERE id = ?1");
    conn.query_row(&sql, params![id], map_pattern_row)
        .optional()
        .map_err(StorageError::sqlite)
}

/// Count patterns of a window by status.
pub fn count_patterns(
    conn: &Connection,
    window_days: u32,
    status: PatternStatus,
) -> Result<u64, StorageError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM patterns WHERE window_days = ?1 AND status = ?2",
            params![window_days, status.name()],
            |row| row.get(0),
        )
        .map_err(StorageError::sqlite)?;
    Ok(count.max(0) as u64)
}

/// Score rows of one pattern, highest score first.
pub fn scores_for_pattern(
    conn: &Connection,
    pattern_id: i64,
) -> Result<Vec<PatternScoreRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT pattern_id, number, score, confidence, period_start, period_end,
                    details, reasoning
             FROM pattern_scores
             WHERE pattern_id = ?1
             ORDER BY score DESC, number ASC",
        )
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![pattern_id], |row| {
            Ok(PatternScoreRecord {
                pattern_id: row.get(0)?,
                number: row.get(1)?,
                score: row.get(2)?,
                confidence: row.get(3)?,
                period_start: date_from_row(row, 4)?,
                period_end: date_from_row(row, 5)?,
                details: row.get(6)?,
                reasoning: row.get(7)?,
            })
        })
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

fn map_pattern_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatternRecord> {
    let kind: String = row.get(1)?;
    let status: String = row.get(7)?;
    Ok(PatternRecord {
        id: row.get(0)?,
        kind: kind.parse().map_err(|e: String| conversion_error(1, e))?,
        signature: row.get(2)?,
        window_days: row.get(3)?,
        params: row.get(4)?,
        strength: row.get(5)?,
        support: row.get::<_, i64>(6)?.max(0) as u64,
        status: status.parse().map_err(|e: String| conversion_error(7, e))?,
        batch_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
