//! Connection management: write-serialized + read-pooled.

pub mod pool;
pub mod pragmas;
pub mod writer;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use quiniela_core::config::StorageConfig;
use quiniela_core::errors::StorageError;
use quiniela_core::events::EventDispatcher;
use rusqlite::Connection;

use self::pool::ReadPool;
use self::pragmas::{apply_pragmas, is_wal_mode};
use crate::migrations;

/// Owns the single write connection and the read connection pool.
///
/// File-backed databases read through the pool. In-memory databases cannot be
/// shared between connections, so their reads go through the writer.
pub struct DatabaseManager {
    writer: Mutex<Connection>,
    readers: Option<ReadPool>,
    path: Option<PathBuf>,
    retention_days: u32,
    events: EventDispatcher,
}

impl DatabaseManager {
    /// Open a database at the given path, apply pragmas, run migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::open_with_pool_size(path, ReadPool::default_size())
    }

    /// Open the database named by a storage config section, with its
    /// pool size and retention period.
    pub fn open_from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Ok(Self::open_with_pool_size(
            &config.effective_database_path(),
            config.effective_read_pool_size(),
        )?
        .with_retention_days(config.effective_retention_days()))
    }

    fn open_with_pool_size(path: &Path, pool_size: usize) -> Result<Self, StorageError> {
        let writer = Connection::open(path).map_err(StorageError::sqlite)?;
        apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        let readers = ReadPool::open(path, pool_size)?;
        tracing::debug!(path = %path.display(), readers = readers.size(), "opened database");

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Some(readers),
            path: Some(path.to_path_buf()),
            retention_days: StorageConfig::default().effective_retention_days(),
            events: EventDispatcher::new(),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let writer = Connection::open_in_memory().map_err(StorageError::sqlite)?;
        apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: None,
            path: None,
            retention_days: StorageConfig::default().effective_retention_days(),
            events: EventDispatcher::new(),
        })
    }

    /// Attach an event dispatcher notified of committed writes.
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Keep draws for `days` when retention runs.
    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }

    pub fn retention_days(&self) -> u32 {
        self.retention_days
    }

    pub(crate) fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Execute a write operation with the serialized writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self.writer.lock().map_err(|_| StorageError::SqliteError {
            message: "write lock poisoned".to_string(),
        })?;
        f(&guard)
    }

    /// Execute a read operation with a pooled read connection.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        match &self.readers {
            Some(pool) => pool.with_conn(f),
            None => self.with_writer(f),
        }
    }

    /// Truncate the WAL after a large delete. A no-op outside WAL mode.
    pub fn checkpoint(&self) -> Result<bool, StorageError> {
        self.with_writer(|conn| {
            if !is_wal_mode(conn)? {
                return Ok(false);
            }
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(StorageError::sqlite)?;
            Ok(true)
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl std::fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseManager")
            .field("path", &self.path)
            .field("readers", &self.readers.as_ref().map(ReadPool::size))
            .field("retention_days", &self.retention_days)
            .finish()
    }
}
