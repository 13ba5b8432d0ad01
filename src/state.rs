use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::lifecycle::LifecycleEngine;
use crate::engine::stats::StatsEngine;
use crate::observability::metrics::Metrics;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub lifecycle: LifecycleEngine,
    pub stats: StatsEngine,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let metrics = Metrics::new();
        let lifecycle = LifecycleEngine::new(store.clone(), metrics.clone());
        let stats = StatsEngine::new(
            store.clone(),
            metrics.clone(),
            Duration::from_secs(config.stats_cache_ttl_secs),
            config.stats_retry_attempts,
            Duration::from_millis(config.stats_retry_backoff_ms),
        );

        Self {
            store,
            lifecycle,
            stats,
            metrics,
        }
    }
}
