use std::time::Duration;

/// Engine tuning. Injected at construction; there is no ambient global.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent executions against the provider.
    pub workers: usize,
    /// How long terminal progress/results stay queryable before purge.
    pub retention_window: Duration,
    /// Upper bound on a single provider call.
    pub provider_timeout: Duration,
    /// Safety-net interval for the drain loop, so a missed trigger cannot
    /// stall the queue indefinitely.
    pub drain_interval: Duration,
    /// Artificial delay before a cache hit reports completion, preserving
    /// the asynchronous contract for callers.
    pub cache_hit_delay: Duration,
    /// Entry count past which the result cache sweeps expired entries.
    pub cache_high_water: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            retention_window: Duration::from_secs(60),
            provider_timeout: Duration::from_secs(60),
            drain_interval: Duration::from_secs(1),
            cache_hit_delay: Duration::from_millis(50),
            cache_high_water: 256,
        }
    }
}

impl EngineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_retention_window(mut self, window: Duration) -> Self {
        self.retention_window = window;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    pub fn with_cache_hit_delay(mut self, delay: Duration) -> Self {
        self.cache_hit_delay = delay;
        self
    }

    pub fn with_cache_high_water(mut self, high_water: usize) -> Self {
        self.cache_high_water = high_water;
        self
    }
}
