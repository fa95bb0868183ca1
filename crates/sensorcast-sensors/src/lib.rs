//! Sensor data for Sensorcast.
//!
//! - [`Sensor`]: the record pushed to dashboards
//! - [`SensorRepository`] / [`InMemorySensorRepository`]: the data source
//! - [`SensorSimulator`]: background task that keeps readings moving
//! - [`SensorService`] / [`CachedSensorService`]: serialized, TTL-cached reads
//!   consumed by the HTTP layer

mod error;
mod model;
mod repository;
mod service;
mod simulator;

pub use error::{ErrorKind, Result, SensorError};
pub use model::{Sensor, SensorStatus, SensorType};
pub use repository::{InMemorySensorRepository, SensorRepository};
pub use service::{
    ALL_SENSORS_KEY, CachedSensorService, MAX_ID_LEN, SENSOR_KEY_PREFIX, SensorService,
    validate_sensor_id,
};
pub use simulator::{DEFAULT_UPDATE_INTERVAL, SensorSimulator};
