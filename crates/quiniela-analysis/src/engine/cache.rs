//! Time-bounded cache of pattern aggregations, keyed by window.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use quiniela_core::config::EngineConfig;

use super::report::Aggregation;

const MAX_WINDOWS: u64 = 64;

/// Aggregation cache owned by whoever builds the engine.
///
/// Cloning shares the underlying entries.
#[derive(Clone)]
pub struct AggregationCache {
    cache: Cache<u32, Arc<Aggregation>>,
}

impl AggregationCache {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_WINDOWS)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Duration::from_secs(config.effective_aggregation_ttl_secs()))
    }

    pub fn get(&self, window_days: u32) -> Option<Arc<Aggregation>> {
        self.cache.get(&window_days)
    }

    pub fn insert(&self, window_days: u32, aggregation: Arc<Aggregation>) {
        self.cache.insert(window_days, aggregation);
    }

    /// Drop the entry for one window.
    pub fn invalidate(&self, window_days: u32) {
        self.cache.invalidate(&window_days);
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for AggregationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_and_invalidate() {
        let cache = AggregationCache::new(Duration::from_secs(60));
        cache.insert(365, Arc::new(Aggregation::empty()));
        assert!(cache.get(365).is_some());
        assert!(cache.get(730).is_none());

        cache.invalidate(365);
        assert!(cache.get(365).is_none());
    }
}
