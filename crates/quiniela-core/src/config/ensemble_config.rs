//! Ensemble service configuration.

use serde::{Deserialize, Serialize};

/// Configuration for strategy combination and degradation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Prediction memo time-to-live in seconds. Default: 300.
    pub prediction_ttl_secs: Option<u64>,
    /// Multiplier applied to the confidence threshold on the single relax step. Default: 0.5.
    pub relax_factor: Option<f64>,
    /// Lowest share any component weight may fall to. Default: 0.05.
    pub min_component_weight: Option<f64>,
    /// Minimum candidates a component must produce to be trusted. Default: 10.
    pub min_component_candidates: Option<usize>,
}

impl EnsembleConfig {
    pub fn effective_prediction_ttl_secs(&self) -> u64 {
        self.prediction_ttl_secs.unwrap_or(300)
    }

    pub fn effective_relax_factor(&self) -> f64 {
        self.relax_factor.unwrap_or(0.5)
    }

    pub fn effective_min_component_weight(&self) -> f64 {
        self.min_component_weight.unwrap_or(0.05)
    }

    pub fn effective_min_component_candidates(&self) -> usize {
        self.min_component_candidates.unwrap_or(10)
    }
}
