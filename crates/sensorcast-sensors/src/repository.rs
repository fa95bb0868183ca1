//! Sensor data source.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use rand::Rng;

use crate::error::{Result, SensorError};
use crate::model::{Sensor, SensorType};

/// Read access to sensor state.
///
/// Implementations must be safe to share across the streaming sessions and
/// request handlers of a running server.
pub trait SensorRepository: Send + Sync + 'static {
    /// Every sensor, ordered by id.
    fn all(&self) -> Result<Vec<Sensor>>;

    /// One sensor, or [`SensorError::NotFound`].
    fn by_id(&self, id: &str) -> Result<Sensor>;
}

/// Sensor readings held in process memory. Lost on restart.
pub struct InMemorySensorRepository {
    sensors: RwLock<BTreeMap<String, Sensor>>,
    updates: AtomicU64,
}

impl Default for InMemorySensorRepository {
    fn default() -> Self {
        Self::seeded()
    }
}

impl InMemorySensorRepository {
    /// Create a repository with no sensors.
    pub fn empty() -> Self {
        Self {
            sensors: RwLock::new(BTreeMap::new()),
            updates: AtomicU64::new(0),
        }
    }

    /// Create a repository with the demo sensor fleet.
    pub fn seeded() -> Self {
        let repo = Self::empty();
        repo.insert(
            Sensor::new("temp-001", "Temperature Sensor 1", SensorType::Temperature)
                .with_temperature(25.0),
        );
        repo.insert(
            Sensor::new("temp-002", "Temperature Sensor 2", SensorType::Temperature)
                .with_temperature(22.5),
        );
        repo.insert(
            Sensor::new("humid-001", "Humidity Sensor 1", SensorType::Humidity).with_humidity(45.0),
        );
        repo.insert(
            Sensor::new("combined-001", "Combined Sensor 1", SensorType::Combined)
                .with_temperature(24.0)
                .with_humidity(40.0),
        );
        repo
    }

    /// Add or replace a sensor.
    pub fn insert(&self, sensor: Sensor) {
        self.sensors.write().insert(sensor.id.clone(), sensor);
    }

    pub fn len(&self) -> usize {
        self.sensors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.read().is_empty()
    }

    /// How many random updates have been applied.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Move every reading to a new random value around a shared baseline.
    pub fn apply_random_update(&self) {
        self.apply_update_with(&mut rand::rng());
    }

    /// Baselines: 20–30 °C and 30–50 %. Temperatures jitter ±1 around the
    /// baseline, humidity ±2.5.
    pub(crate) fn apply_update_with<G: Rng>(&self, rng: &mut G) {
        let base_temperature = rng.random_range(20.0..30.0);
        let base_humidity = rng.random_range(30.0..50.0);
        let now = Utc::now();

        let mut sensors = self.sensors.write();
        for sensor in sensors.values_mut() {
            sensor.timestamp = now;
            if sensor.sensor_type.measures_temperature() {
                sensor.temperature = base_temperature + rng.random_range(-1.0..1.0);
            }
            if sensor.sensor_type.measures_humidity() {
                sensor.humidity = base_humidity + rng.random_range(-2.5..2.5);
            }
        }
        drop(sensors);

        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}

impl SensorRepository for InMemorySensorRepository {
    fn all(&self) -> Result<Vec<Sensor>> {
        Ok(self.sensors.read().values().cloned().collect())
    }

    fn by_id(&self, id: &str) -> Result<Sensor> {
        self.sensors
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SensorError::NotFound(id.to_string()))
    }
}
