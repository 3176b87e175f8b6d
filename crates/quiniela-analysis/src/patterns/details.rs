//! Measured parameters per pattern and per-number score details.

use serde::{Deserialize, Serialize};

/// A weekday whose conditional rate deviates from the number's overall rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayDeviation {
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: u32,
    pub rate: f64,
    pub z_score: f64,
    pub count: u32,
    pub total: u32,
}

/// Measurements stored with a pattern row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternParams {
    MarkovTransition {
        threshold: f64,
        mean_prob: f64,
        std_prob: f64,
        transition_count: usize,
    },
    WeekdayBias {
        expected_rate: f64,
        max_z_score: f64,
        p_value: f64,
        significant_days: Vec<WeekdayDeviation>,
    },
    MonthlySeasonal {
        coefficient_variation: f64,
        peak_months: Vec<u32>,
        month_rates: [f64; 12],
    },
    NumberCorrelation {
        pmi: f64,
        chi_square: f64,
        p_value: f64,
        joint_count: u32,
    },
}

/// Why one number received its score from one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreDetails {
    Transition {
        from_number: u8,
        transition_probability: f64,
        z_score: f64,
    },
    WeekdayBias {
        expected_rate: f64,
        max_z_score: f64,
        biased_weekdays: Vec<u32>,
    },
    MonthlySeasonal {
        coefficient_variation: f64,
        peak_months: Vec<u32>,
    },
    Correlation {
        correlated_with: u8,
        pmi: f64,
        joint_count: u32,
        chi_square: f64,
    },
}
