//! Configuration for the TTL cache.

use std::time::Duration;

/// Default lifetime of a cached payload.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Default period between background sweeps.
/// Much longer than typical entry TTLs so the write lock is taken rarely.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configuration for the TTL cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL callers apply when they have no more specific lifetime.
    pub default_ttl: Duration,

    /// Interval for the background sweeper.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL for cached payloads.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(30));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert!(config.sweep_interval > config.default_ttl);
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new()
            .with_default_ttl(Duration::from_secs(5))
            .with_sweep_interval(Duration::from_secs(60));
        assert_eq!(config.default_ttl, Duration::from_secs(5));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }
}
