//! Scoring components: independent transforms from draw history (or the
//! pattern engine) to a (score, confidence, details) triple per number.
//!
//! Components are side-effect free. Each output is checked by
//! [`validation::validate`] before the ensemble trusts it.

pub mod frequency;
pub mod gap;
pub mod pattern;
pub mod trend;
pub mod validation;

pub use frequency::FrequencyComponent;
pub use gap::GapComponent;
pub use pattern::PatternComponent;
pub use trend::TrendComponent;
pub use validation::{validate, ComponentStatus};

use std::fmt;

use chrono::NaiveDate;
use quiniela_core::errors::ScoringError;
use quiniela_core::types::PatternKind;
use serde::Serialize;

/// The four scoring signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Frequency,
    Gap,
    Trend,
    Pattern,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [Self::Frequency, Self::Gap, Self::Trend, Self::Pattern];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Gap => "gap",
            Self::Trend => "trend",
            Self::Pattern => "pattern",
        }
    }

    /// Draw records at which the component's data volume counts as complete.
    pub fn volume_target(&self) -> usize {
        match self {
            Self::Frequency => 300,
            Self::Gap => 150,
            Self::Trend => 90,
            Self::Pattern => 300,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a number's recent frequency against its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Component-specific measurements behind a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentDetails {
    Frequency {
        appearances: u32,
        relative_frequency: f64,
        z_score: f64,
    },
    Gap {
        days_since_last: i64,
        average_gap: f64,
        median_gap: f64,
        gap_std: f64,
        delay_ratio: f64,
        appearances: usize,
    },
    Trend {
        recent: f64,
        medium: f64,
        base: f64,
        momentum: f64,
        direction: TrendDirection,
    },
    Pattern {
        patterns: usize,
        kinds: Vec<PatternKind>,
    },
    DigitHeuristic {
        tens_match: bool,
        units_match: bool,
    },
}

/// One number's score from one component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentResult {
    pub number: u8,
    /// In [0, 100].
    pub score: f64,
    /// In [0, 1].
    pub confidence: f64,
    pub details: ComponentDetails,
}

/// Everything one component produced for a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentOutput {
    pub kind: ComponentKind,
    /// Ordered by number.
    pub results: Vec<ComponentResult>,
    /// Set when the component served a fallback instead of its primary signal.
    pub degraded: bool,
}

impl ComponentOutput {
    pub fn new(kind: ComponentKind, mut results: Vec<ComponentResult>) -> Self {
        results.sort_by_key(|r| r.number);
        Self {
            kind,
            results,
            degraded: false,
        }
    }

    pub fn result_for(&self, number: u8) -> Option<&ComponentResult> {
        self.results
            .binary_search_by_key(&number, |r| r.number)
            .ok()
            .map(|i| &self.results[i])
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Inputs shared by every component for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringContext {
    pub window_days: u32,
    /// Last date included in the window.
    pub as_of: NaiveDate,
    /// Unix seconds, used for pattern batch age.
    pub now: i64,
}

/// A scoring signal.
pub trait ScoringComponent: Send + Sync {
    fn kind(&self) -> ComponentKind;

    fn score(&self, ctx: &ScoringContext) -> Result<ComponentOutput, ScoringError>;
}

pub(crate) fn no_data(kind: ComponentKind, message: impl Into<String>) -> ScoringError {
    ScoringError::NoData {
        component: kind.name(),
        message: message.into(),
    }
}
