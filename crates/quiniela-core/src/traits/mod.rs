//! Repository traits implemented by `quiniela-storage`.
//!
//! Analysis code depends only on these seams, so detectors and scoring
//! components can run against SQLite or an in-memory fake.

pub mod draw_repository;
pub mod pattern_repository;

pub use draw_repository::DrawRepository;
pub use pattern_repository::PatternRepository;
