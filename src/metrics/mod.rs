//! System metrics snapshot, served read-through from a short-lived cache.

pub mod cache;
pub mod sampler;
pub mod snapshot;

pub use cache::{Fresh, SharedClock, TtlCache};
pub use sampler::{SysinfoSampler, SystemSampler};
pub use snapshot::{MetricsSnapshot, RawSample};

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::FieldcheckError;

pub const METRICS_CACHE_KEY: &str = "system-metrics";

pub struct MetricsService {
    cache: TtlCache<MetricsSnapshot>,
    sampler: Arc<dyn SystemSampler>,
}

impl MetricsService {
    pub fn new(ttl: Duration, clock: SharedClock, sampler: Arc<dyn SystemSampler>) -> Self {
        Self {
            cache: TtlCache::new(ttl, clock),
            sampler,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// Cached snapshot while fresh, otherwise a new sample.
    pub async fn snapshot(&self) -> Result<Fresh<MetricsSnapshot>, FieldcheckError> {
        if let Some(hit) = self.cache.get(METRICS_CACHE_KEY) {
            debug!(remaining_ms = hit.remaining.as_millis() as u64, "metrics cache hit");
            return Ok(hit);
        }

        let sampler = self.sampler.clone();
        let raw = tokio::task::spawn_blocking(move || sampler.sample())
            .await
            .map_err(|e| FieldcheckError::Sampling(format!("sampling task failed: {e}")))??;

        let snapshot = MetricsSnapshot::from_sample(&raw, self.cache.now());
        info!(
            cpu_usage = snapshot.cpu_usage,
            memory_usage = snapshot.memory_usage,
            health_score = snapshot.health_score,
            "metrics snapshot recomputed"
        );
        Ok(self.cache.set(METRICS_CACHE_KEY, snapshot))
    }

    pub fn invalidate(&self) -> bool {
        self.cache.expire(METRICS_CACHE_KEY)
    }
}
