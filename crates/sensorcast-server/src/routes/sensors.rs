//! Sensor snapshot endpoints.
//!
//! Both handlers return the cached JSON bytes as-is.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::error::{Result, ServerError};
use crate::state::AppState;

fn json_bytes(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// GET /api/sensors
pub async fn list_sensors_handler(State(state): State<AppState>) -> Result<Response> {
    let body = state
        .sensors
        .get_all_snapshot()
        .await
        .map_err(|e| ServerError::sensor("failed to get sensor data", e))?;

    Ok(json_bytes(body))
}

/// GET /api/sensors/{id}
pub async fn get_sensor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let body = state
        .sensors
        .get_by_key(&id)
        .await
        .map_err(|e| ServerError::sensor(format!("failed to get sensor {id}"), e))?;

    Ok(json_bytes(body))
}

/// GET /api/sensors/
pub async fn missing_sensor_id_handler() -> ServerError {
    ServerError::BadRequest("sensor ID is required".to_string())
}
