//! Domain types shared across crates.

pub mod draw;
pub mod pattern;

pub use draw::{Draw, NumberFrequency, SaveOutcome, MAX_POSITION, NUMBER_COUNT};
pub use pattern::{
    ActivePatternQuery, BatchInfo, NewPattern, NewPatternScore, PatternKind, PatternRecord,
    PatternScoreRecord, PatternStatus, PersistOutcome, ScorePeriod,
};
