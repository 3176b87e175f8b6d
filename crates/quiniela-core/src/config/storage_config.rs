//! Storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the SQLite database.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file. Default: `quiniela.db`.
    pub database_path: Option<PathBuf>,
    /// Draws older than this many days are removed by retention. Default: 3650.
    pub retention_days: Option<u32>,
    /// Read connections in the pool. Default: 4.
    pub read_pool_size: Option<usize>,
}

impl StorageConfig {
    pub fn effective_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("quiniela.db"))
    }

    pub fn effective_retention_days(&self) -> u32 {
        self.retention_days.unwrap_or(3650)
    }

    pub fn effective_read_pool_size(&self) -> usize {
        self.read_pool_size.unwrap_or(4)
    }
}
