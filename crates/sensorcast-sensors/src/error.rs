//! Error types for sensor lookups.

/// Closed classification of failures, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested sensor does not exist.
    NotFound,
    /// The caller supplied a malformed argument.
    InvalidInput,
    /// Anything else. Details are not shown to clients.
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Internal => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Error type for sensor operations.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// No sensor with this id.
    #[error("Sensor with ID {0} not found")]
    NotFound(String),

    /// The id failed validation before any lookup.
    #[error("Invalid sensor ID {id:?}: {reason}")]
    InvalidId { id: String, reason: &'static str },

    /// Sensor data could not be encoded.
    #[error("Failed to serialize sensor data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The data source could not be reached.
    #[error("Sensor source unavailable: {0}")]
    Unavailable(String),
}

impl SensorError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SensorError::NotFound(_) => ErrorKind::NotFound,
            SensorError::InvalidId { .. } => ErrorKind::InvalidInput,
            SensorError::Serialization(_) | SensorError::Unavailable(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for sensor operations.
pub type Result<T> = std::result::Result<T, SensorError>;
