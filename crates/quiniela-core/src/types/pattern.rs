//! Pattern and pattern-score records exchanged with the pattern store.
//!
//! Signatures and details travel as canonical JSON strings; the typed
//! payloads live in `quiniela-analysis` and are encoded before persisting.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Detector family that produced a pattern. Doubles as the storage discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Sequential,
    Cyclical,
    Correlation,
}

impl PatternKind {
    pub const ALL: [PatternKind; 3] = [Self::Sequential, Self::Cyclical, Self::Correlation];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Cyclical => "cyclical",
            Self::Correlation => "correlation",
        }
    }

    /// Base aggregation weight for patterns of this kind.
    pub fn base_weight(&self) -> f64 {
        match self {
            Self::Sequential => 0.4,
            Self::Cyclical => 0.3,
            Self::Correlation => 0.3,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(Self::Sequential),
            "cyclical" => Ok(Self::Cyclical),
            "correlation" => Ok(Self::Correlation),
            other => Err(format!("unknown pattern kind '{other}'")),
        }
    }
}

/// Lifecycle status of a stored pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    Active,
    Inactive,
}

impl PatternStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for PatternStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown pattern status '{other}'")),
        }
    }
}

/// A stored pattern row.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRecord {
    pub id: i64,
    pub kind: PatternKind,
    pub signature: String,
    pub window_days: u32,
    pub params: String,
    pub strength: f64,
    pub support: u64,
    pub status: PatternStatus,
    pub batch_id: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

/// A stored per-number score row.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternScoreRecord {
    pub pattern_id: i64,
    pub number: u8,
    pub score: f64,
    pub confidence: f64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub details: String,
    pub reasoning: String,
}

/// A detected pattern ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPattern {
    pub kind: PatternKind,
    /// Canonical JSON identity of the pattern within its kind.
    pub signature: String,
    /// JSON of the measured values (thresholds, statistics).
    pub params: String,
    pub strength: f64,
    pub support: u64,
    pub scores: Vec<NewPatternScore>,
}

/// A per-number score attached to a `NewPattern`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatternScore {
    pub number: u8,
    pub score: f64,
    pub confidence: f64,
    pub details: String,
    pub reasoning: String,
}

/// Date span a batch of scores was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// What happened when a pattern was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub pattern_id: i64,
    /// True when an existing (kind, signature, window) row was refreshed.
    pub refreshed: bool,
    pub scores_written: usize,
}

/// Filter for active pattern lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePatternQuery {
    pub window_days: u32,
    pub min_strength: f64,
    /// Exact batch, or `None` for the most recently updated batch of the window.
    pub batch_id: Option<String>,
}

/// Identity and age of the newest active batch for a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInfo {
    pub batch_id: String,
    /// Unix seconds of the newest update in the batch.
    pub updated_at: i64,
    pub pattern_count: u64,
}
