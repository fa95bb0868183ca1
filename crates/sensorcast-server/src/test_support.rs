//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use sensorcast_cache::TtlCache;
use sensorcast_sensors::{
    CachedSensorService, InMemorySensorRepository, SensorError, SensorService,
};

use crate::config::ServerConfig;
use crate::state::AppState;

/// State over the four seeded sensors behind a real cache.
pub(crate) fn seeded_state(config: ServerConfig) -> AppState {
    let service = CachedSensorService::new(
        Arc::new(InMemorySensorRepository::seeded()),
        TtlCache::default(),
    );
    AppState::new(Arc::new(service), config)
}

/// A data source that is always down.
#[derive(Default)]
pub(crate) struct UnavailableService {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SensorService for UnavailableService {
    async fn get_all_snapshot(&self) -> sensorcast_sensors::Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SensorError::Unavailable("connection refused".into()))
    }

    async fn get_by_key(&self, _id: &str) -> sensorcast_sensors::Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SensorError::Unavailable("connection refused".into()))
    }
}
