//! HTTP routes.

pub mod environment;
pub mod fallback;
pub mod health;
pub mod sensors;
pub mod stream;

pub use environment::{EnvironmentResponse, environment_handler};
pub use fallback::not_found_handler;
pub use health::{HealthResponse, health_routes};
pub use sensors::{get_sensor_handler, list_sensors_handler, missing_sensor_id_handler};
pub use stream::stream_handler;
