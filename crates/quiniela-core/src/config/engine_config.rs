//! Pattern engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for batch persistence and aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Patterns not refreshed within this many hours are deactivated. Default: 24.
    pub staleness_hours: Option<u32>,
    /// Aggregation cache time-to-live in seconds. Default: 3600.
    pub aggregation_ttl_secs: Option<u64>,
    /// Minimum strength for a pattern to take part in aggregation. Default: 0.1.
    pub min_pattern_strength: Option<f64>,
    /// Window used when callers do not pass one. Default: 1825 (five years).
    pub default_window_days: Option<u32>,
}

impl EngineConfig {
    pub fn effective_staleness_hours(&self) -> u32 {
        self.staleness_hours.unwrap_or(24)
    }

    pub fn effective_staleness_secs(&self) -> i64 {
        i64::from(self.effective_staleness_hours()) * 3600
    }

    pub fn effective_aggregation_ttl_secs(&self) -> u64 {
        self.aggregation_ttl_secs.unwrap_or(3600)
    }

    pub fn effective_min_pattern_strength(&self) -> f64 {
        self.min_pattern_strength.unwrap_or(0.1)
    }

    pub fn effective_default_window_days(&self) -> u32 {
        self.default_window_days.unwrap_or(1825)
    }
}
