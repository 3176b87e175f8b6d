//! Pattern identity.

use quiniela_core::types::PatternKind;
use serde::{Deserialize, Serialize};

/// Identity of a pattern within its kind and window.
///
/// Only identifying fields live here. Measured values (thresholds, PMI,
/// coefficients) go in `PatternParams`, so rediscovering the same structure
/// with new measurements refreshes the existing row instead of adding one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternSignature {
    /// High-probability next-day transitions out of `from_number`.
    MarkovTransition { from_number: u8 },
    /// `number` is drawn at an unusual rate on some weekdays.
    WeekdayBias { number: u8 },
    /// `number` is drawn at an unusual rate in some months.
    MonthlySeasonal { number: u8 },
    /// Two numbers co-occur on the same date more than chance. Sorted ascending.
    NumberCorrelation { numbers: [u8; 2] },
}

impl PatternSignature {
    /// Correlation signature with the pair in canonical order.
    pub fn correlation(a: u8, b: u8) -> Self {
        Self::NumberCorrelation {
            numbers: [a.min(b), a.max(b)],
        }
    }

    pub fn kind(&self) -> PatternKind {
        match self {
            Self::MarkovTransition { .. } => PatternKind::Sequential,
            Self::WeekdayBias { .. } | Self::MonthlySeasonal { .. } => PatternKind::Cyclical,
            Self::NumberCorrelation { .. } => PatternKind::Correlation,
        }
    }

    /// Canonical JSON used as the storage key.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_pair_is_order_independent() {
        assert_eq!(
            PatternSignature::correlation(42, 7),
            PatternSignature::correlation(7, 42)
        );
    }

    #[test]
    fn json_carries_discriminator() {
        let json = PatternSignature::WeekdayBias { number: 13 }.to_json().unwrap();
        assert_eq!(json, r#"{"type":"weekday_bias","number":13}"#);
        assert_eq!(
            PatternSignature::from_json(&json).unwrap(),
            PatternSignature::WeekdayBias { number: 13 }
        );
    }

    #[test]
    fn kinds_follow_detectors() {
        assert_eq!(
            PatternSignature::MarkovTransition { from_number: 1 }.kind(),
            PatternKind::Sequential
        );
        assert_eq!(
            PatternSignature::MonthlySeasonal { number: 1 }.kind(),
            PatternKind::Cyclical
        );
        assert_eq!(
            PatternSignature::correlation(1, 2).kind(),
            PatternKind::Correlation
        );
    }
}
