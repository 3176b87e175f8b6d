//! Draw history and metadata queries.

use chrono::NaiveDate;
use quiniela_core::errors::StorageError;
use quiniela_core::types::{Draw, SaveOutcome};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

use super::{date_from_row, date_to_sql};

/// Metadata key holding the unix time of the last inserted draw.
pub const LAST_UPDATE_KEY: &str = "last_update";

/// Insert a draw, ignoring an existing (date, number, position) row.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<SaveOutcome, StorageError> {
    let changed = conn
        .prepare_cached(
            "INSERT INTO draw_results (draw_date, number, position)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (draw_date, number, position) DO NOTHING",
        )
        .and_then(|mut stmt| stmt.execute(params![date_to_sql(draw.date), draw.number, draw.position]))
        .map_err(StorageError::sqlite)?;

    Ok(if changed == 0 {
        SaveOutcome::Duplicate
    } else {
        SaveOutcome::Inserted
    })
}

/// Draws with `start <= date <= end`, ascending by date then position.
pub fn draws_in_period(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Draw>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT draw_date, number, position FROM draw_results
             WHERE draw_date BETWEEN ?1 AND ?2
             ORDER BY draw_date ASC, position ASC, number ASC",
        )
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![date_to_sql(start), date_to_sql(end)], map_draw_row)
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

/// Most recent draws, newest date first.
pub fn recent_draws(conn: &Connection, limit: usize) -> Result<Vec<Draw>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT draw_date, number, position FROM draw_results
             ORDER BY draw_date DESC, position ASC, number ASC
             LIMIT ?1",
        )
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![limit as i64], map_draw_row)
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

/// Appearance counts per number in `start..=end`, most frequent first.
pub fn number_counts(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<(u8, u32)>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT number, COUNT(*) AS appearances FROM draw_results
             WHERE draw_date BETWEEN ?1 AND ?2
             GROUP BY number
             ORDER BY appearances DESC, number ASC",
        )
        .map_err(StorageError::sqlite)?;
    let rows = stmt
        .query_map(params![date_to_sql(start), date_to_sql(end)], |row| {
            Ok((row.get::<_, u8>(0)?, row.get::<_, u32>(1)?))
        })
        .map_err(StorageError::sqlite)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StorageError::sqlite)
}

/// Distinct draw dates in `start..=end`.
pub fn distinct_dates(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<u32, StorageError> {
    conn.query_row(
        "SELECT COUNT(DISTINCT draw_date) FROM draw_results WHERE draw_date BETWEEN ?1 AND ?2",
        params![date_to_sql(start), date_to_sql(end)],
        |row| row.get(0),
    )
    .map_err(StorageError::sqlite)
}

/// Oldest and newest stored draw dates.
pub fn date_bounds(conn: &Connection) -> Result<Option<(NaiveDate, NaiveDate)>, StorageError> {
    let bounds: (Option<String>, Option<String>) = conn
        .query_row(
            "SELECT MIN(draw_date), MAX(draw_date) FROM draw_results",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(StorageError::sqlite)?;

    match bounds {
        (Some(min), Some(max)) => Ok(Some((parse_date(&min)?, parse_date(&max)?))),
        _ => Ok(None),
    }
}

/// Total stored draws.
pub fn count_draws(conn: &Connection) -> Result<u64, StorageError> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM draw_results", [], |row| row.get(0))
        .map_err(StorageError::sqlite)?;
    Ok(count.max(0) as u64)
}

/// Delete draws dated before `cutoff`. Returns rows removed.
pub fn delete_draws_before(conn: &Connection, cutoff: NaiveDate) -> Result<usize, StorageError> {
    conn.execute(
        "DELETE FROM draw_results WHERE draw_date < ?1",
        params![date_to_sql(cutoff)],
    )
    .map_err(StorageError::sqlite)
}

/// Insert or replace a metadata value.
pub fn set_metadata(
    conn: &Connection,
    key: &str,
    value: &str,
    now: i64,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO metadata (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )
    .map_err(StorageError::sqlite)?;
    Ok(())
}

/// Read a metadata value.
pub fn get_metadata(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(StorageError::sqlite)
}

fn map_draw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Draw> {
    let date = date_from_row(row, 0)?;
    let number: u8 = row.get(1)?;
    let position: u8 = row.get(2)?;
    Draw::new(date, number, position)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Integer, Box::new(e)))
}

fn parse_date(text: &str) -> Result<NaiveDate, StorageError> {
    NaiveDate::parse_from_str(text, super::DATE_FORMAT).map_err(|e| StorageError::InvalidRecord {
        message: format!("bad draw_date '{text}': {e}"),
    })
}
