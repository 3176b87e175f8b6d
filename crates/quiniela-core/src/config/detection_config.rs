//! Detector thresholds.

use serde::{Deserialize, Serialize};

/// Configuration for the three pattern detectors.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum draws for the sequential detector. Default: 100.
    pub sequential_min_draws: Option<usize>,
    /// Minimum draws for the cyclical detector. Default: 200.
    pub cyclical_min_draws: Option<usize>,
    /// Minimum draws for the correlation detector. Default: 300.
    pub correlation_min_draws: Option<usize>,
    /// Additive smoothing applied to every transition cell. Default: 0.01.
    pub markov_smoothing: Option<f64>,
    /// Data-bearing days used as sequential context. Default: 7.
    pub context_days: Option<usize>,
    /// Two-sided z threshold for weekday bias. Default: 1.96.
    pub weekday_z_threshold: Option<f64>,
    /// Minimum PMI for a correlated pair. Default: 0.5.
    pub min_pmi: Option<f64>,
    /// Minimum joint day count for a correlated pair. Default: 5.
    pub min_joint_count: Option<u32>,
}

impl DetectionConfig {
    pub fn effective_sequential_min_draws(&self) -> usize {
        self.sequential_min_draws.unwrap_or(100)
    }

    pub fn effective_cyclical_min_draws(&self) -> usize {
        self.cyclical_min_draws.unwrap_or(200)
    }

    pub fn effective_correlation_min_draws(&self) -> usize {
        self.correlation_min_draws.unwrap_or(300)
    }

    pub fn effective_markov_smoothing(&self) -> f64 {
        self.markov_smoothing.unwrap_or(0.01)
    }

    pub fn effective_context_days(&self) -> usize {
        self.context_days.unwrap_or(7)
    }

    pub fn effective_weekday_z_threshold(&self) -> f64 {
        self.weekday_z_threshold.unwrap_or(1.96)
    }

    pub fn effective_min_pmi(&self) -> f64 {
        self.min_pmi.unwrap_or(0.5)
    }

    pub fn effective_min_joint_count(&self) -> u32 {
        self.min_joint_count.unwrap_or(5)
    }
}
