//! # quiniela-storage
//!
//! SQLite persistence for draw history and versioned pattern batches.
//! One serialized writer, a round-robin read pool, `PRAGMA user_version`
//! migrations, and implementations of the `quiniela-core` repository traits.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod repository;
pub mod retention;

pub use connection::DatabaseManager;
pub use retention::{apply_retention, RetentionReport};
