//! Schema migrations using PRAGMA user_version.

pub mod v001_draws;
pub mod v002_patterns;

use quiniela_core::errors::StorageError;
use rusqlite::Connection;

/// Latest schema version.
pub const LATEST_VERSION: u32 = 2;

/// Run all pending migrations. Each step commits with its version bump.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current = current_version(conn).map_err(|e| StorageError::MigrationFailed {
        version: 0,
        message: e.to_string(),
    })?;

    let migrations: &[(&str, u32)] = &[
        (v001_draws::MIGRATION_SQL, 1),
        (v002_patterns::MIGRATION_SQL, 2),
    ];

    for &(sql, version) in migrations {
        if current >= version {
            continue;
        }
        let failed = |e: rusqlite::Error| StorageError::MigrationFailed {
            version,
            message: e.to_string(),
        };
        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", version)
            .map_err(failed)?;
        tx.commit().map_err(failed)?;
        tracing::info!(version, "applied migration");
    }

    Ok(())
}

/// Current schema version.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(StorageError::sqlite)
}
