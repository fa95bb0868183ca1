//! Sensor record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Temperature,
    Humidity,
    Combined,
}

impl SensorType {
    pub fn measures_temperature(&self) -> bool {
        matches!(self, SensorType::Temperature | SensorType::Combined)
    }

    pub fn measures_humidity(&self) -> bool {
        matches!(self, SensorType::Humidity | SensorType::Combined)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    Inactive,
}

/// A single sensor and its latest reading.
///
/// Readings a sensor does not measure stay at `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub timestamp: DateTime<Utc>,
    pub status: SensorStatus,
}

impl Sensor {
    /// Create an active sensor with zeroed readings.
    pub fn new(id: impl Into<String>, name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sensor_type,
            temperature: 0.0,
            humidity: 0.0,
            timestamp: Utc::now(),
            status: SensorStatus::Active,
        }
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = celsius;
        self
    }

    pub fn with_humidity(mut self, percent: f64) -> Self {
        self.humidity = percent;
        self
    }
}
