//! Named strategies: target component weights plus an adaptability factor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scoring::ComponentKind;

/// Per-component weights, indexed by `ComponentKind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentWeights {
    pub frequency: f64,
    pub gap: f64,
    pub trend: f64,
    pub pattern: f64,
}

impl ComponentWeights {
    pub fn get(&self, kind: ComponentKind) -> f64 {
        match kind {
            ComponentKind::Frequency => self.frequency,
            ComponentKind::Gap => self.gap,
            ComponentKind::Trend => self.trend,
            ComponentKind::Pattern => self.pattern,
        }
    }

    pub fn set(&mut self, kind: ComponentKind, weight: f64) {
        match kind {
            ComponentKind::Frequency => self.frequency = weight,
            ComponentKind::Gap => self.gap = weight,
            ComponentKind::Trend => self.trend = weight,
            ComponentKind::Pattern => self.pattern = weight,
        }
    }

    pub fn total(&self) -> f64 {
        ComponentKind::ALL.iter().map(|&k| self.get(k)).sum()
    }

    pub fn zero() -> Self {
        Self {
            frequency: 0.0,
            gap: 0.0,
            trend: 0.0,
            pattern: 0.0,
        }
    }
}

/// A named combination policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Balanced,
    Conservative,
    Aggressive,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Self::Balanced, Self::Conservative, Self::Aggressive];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Conservative => "conservative",
            Self::Aggressive => "aggressive",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Balanced => "Even blend of frequency, gap, trend and pattern signals",
            Self::Conservative => "Leans on long-run frequency and reacts little to data quality",
            Self::Aggressive => "Favours overdue and trending numbers and adapts strongly to data quality",
        }
    }

    /// Target weights; each set sums to 1.
    pub fn weights(&self) -> ComponentWeights {
        let (frequency, gap, trend, pattern) = match self {
            Self::Balanced => (0.30, 0.25, 0.25, 0.20),
            Self::Conservative => (0.50, 0.20, 0.20, 0.10),
            Self::Aggressive => (0.15, 0.40, 0.35, 0.10),
        };
        ComponentWeights {
            frequency,
            gap,
            trend,
            pattern,
        }
    }

    /// How far data quality may move a weight, in [0, 1].
    pub fn adaptability(&self) -> f64 {
        match self {
            Self::Balanced => 0.5,
            Self::Conservative => 0.2,
            Self::Aggressive => 0.8,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanced" => Ok(Self::Balanced),
            "conservative" => Ok(Self::Conservative),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}
