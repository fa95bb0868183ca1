//! Cache-fronted sensor reads.
//!
//! The HTTP layer only ever sees serialized JSON bytes. Each read consults
//! the [`TtlCache`] first and falls back to the repository on a miss,
//! repopulating the cache with the freshly serialized payload.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sensorcast_cache::TtlCache;
use tracing::{debug, error};

use crate::error::{Result, SensorError};
use crate::repository::SensorRepository;

/// Cache key for the full sensor snapshot.
pub const ALL_SENSORS_KEY: &str = "all_sensors";

/// Prefix for per-sensor cache keys (`sensor_<id>`).
pub const SENSOR_KEY_PREFIX: &str = "sensor_";

/// Longest accepted sensor id.
pub const MAX_ID_LEN: usize = 64;

/// Read-side boundary used by request handlers and streaming sessions.
#[async_trait]
pub trait SensorService: Send + Sync {
    /// JSON array of every sensor.
    async fn get_all_snapshot(&self) -> Result<Bytes>;

    /// JSON object for one sensor.
    async fn get_by_key(&self, id: &str) -> Result<Bytes>;
}

/// Check that `id` is usable as a lookup and cache key.
pub fn validate_sensor_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        "must not be empty"
    } else if id.len() > MAX_ID_LEN {
        "too long"
    } else if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        "only ASCII letters, digits, '-' and '_' are allowed"
    } else {
        return Ok(());
    };

    Err(SensorError::InvalidId {
        id: id.to_string(),
        reason,
    })
}

/// [`SensorService`] backed by a repository and a shared [`TtlCache`].
pub struct CachedSensorService<R> {
    repository: Arc<R>,
    cache: TtlCache,
    ttl: Duration,
}

impl<R: SensorRepository> CachedSensorService<R> {
    /// Entries are cached for the cache's configured default TTL.
    pub fn new(repository: Arc<R>, cache: TtlCache) -> Self {
        let ttl = cache.config().default_ttl;
        Self {
            repository,
            cache,
            ttl,
        }
    }
}

#[async_trait]
impl<R: SensorRepository> SensorService for CachedSensorService<R> {
    async fn get_all_snapshot(&self) -> Result<Bytes> {
        if let Some(bytes) = self.cache.get(ALL_SENSORS_KEY) {
            debug!(key = ALL_SENSORS_KEY, "Cache hit");
            return Ok(bytes);
        }

        let sensors = self.repository.all().inspect_err(|e| {
            error!(error = %e, "Failed to load sensors");
        })?;
        let bytes = Bytes::from(serde_json::to_vec(&sensors)?);

        self.cache.set(ALL_SENSORS_KEY, bytes.clone(), self.ttl);
        debug!(
            key = ALL_SENSORS_KEY,
            count = sensors.len(),
            ttl_secs = self.ttl.as_secs(),
            "Cached sensor snapshot"
        );

        Ok(bytes)
    }

    async fn get_by_key(&self, id: &str) -> Result<Bytes> {
        validate_sensor_id(id)?;

        let key = format!("{SENSOR_KEY_PREFIX}{id}");
        if let Some(bytes) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(bytes);
        }

        let sensor = self.repository.by_id(id)?;
        let bytes = Bytes::from(serde_json::to_vec(&sensor)?);

        self.cache.set(key.clone(), bytes.clone(), self.ttl);
        debug!(key = %key, ttl_secs = self.ttl.as_secs(), "Cached sensor");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sensorcast_cache::CacheConfig;

    use super::*;
    use crate::model::Sensor;
    use crate::repository::InMemorySensorRepository;

    /// Counts how often the underlying source is queried.
    struct CountingRepository {
        inner: InMemorySensorRepository,
        all_calls: AtomicUsize,
        by_id_calls: AtomicUsize,
    }

    impl CountingRepository {
        fn new() -> Self {
            Self {
                inner: InMemorySensorRepository::seeded(),
                all_calls: AtomicUsize::new(0),
                by_id_calls: AtomicUsize::new(0),
            }
        }
    }

    impl SensorRepository for CountingRepository {
        fn all(&self) -> Result<Vec<Sensor>> {
            self.all_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.all()
        }

        fn by_id(&self, id: &str) -> Result<Sensor> {
            self.by_id_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.by_id(id)
        }
    }

    fn service() -> CachedSensorService<CountingRepository> {
        CachedSensorService::new(
            Arc::new(CountingRepository::new()),
            TtlCache::new(CacheConfig::default()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_reads_within_ttl_query_source_once() {
        let service = service();

        let first = service.get_all_snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = service.get_all_snapshot().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.repository.all_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_after_ttl_queries_source_again() {
        let service = service();

        service.get_all_snapshot().await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        service.get_all_snapshot().await.unwrap();

        assert_eq!(service.repository.all_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_is_json_array() {
        let service = service();
        let bytes = service.get_all_snapshot().await.unwrap();

        let sensors: Vec<Sensor> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(sensors.len(), 4);
        assert!(service.cache.get(ALL_SENSORS_KEY).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_by_key_caches_per_sensor() {
        let service = service();

        let bytes = service.get_by_key("temp-001").await.unwrap();
        service.get_by_key("temp-001").await.unwrap();

        let sensor: Sensor = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(sensor.id, "temp-001");
        assert_eq!(service.repository.by_id_calls.load(Ordering::SeqCst), 1);
        assert!(service.cache.get("sensor_temp-001").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_key_is_not_found_and_not_cached() {
        let service = service();

        let err = service.get_by_key("temp-999").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
        assert!(service.cache.get("sensor_temp-999").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_key_never_reaches_source() {
        let service = service();

        for id in ["", "../etc", "a b", &"x".repeat(MAX_ID_LEN + 1)] {
            let err = service.get_by_key(id).await.unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::InvalidInput, "id {id:?}");
        }
        assert_eq!(service.repository.by_id_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validate_sensor_id() {
        assert!(validate_sensor_id("combined-001").is_ok());
        assert!(validate_sensor_id("Sensor_42").is_ok());
        assert!(validate_sensor_id(&"x".repeat(MAX_ID_LEN)).is_ok());
        assert!(validate_sensor_id("temp/001").is_err());
        assert!(validate_sensor_id("température").is_err());
    }
}
