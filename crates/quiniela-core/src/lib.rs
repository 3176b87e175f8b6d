//! # quiniela-core
//!
//! Shared foundation for the quiniela scoring engine: draw and pattern types,
//! one error enum per subsystem, layered TOML configuration, tracing setup,
//! lifecycle events, and the repository traits the storage layer implements.

pub mod config;
pub mod errors;
pub mod events;
pub mod tracing;
pub mod traits;
pub mod types;

pub use config::QuinielaConfig;
pub use traits::{DrawRepository, PatternRepository};
pub use types::{Draw, NumberFrequency, PatternKind, SaveOutcome};
