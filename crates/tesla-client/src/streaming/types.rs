//! Types for the telemetry stream

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Columns requested from the streaming endpoint, in record order
pub const STREAM_COLUMNS: &str =
    "speed,odometer,soc,elevation,est_heading,est_lat,est_lng,power,shift_state,range,est_range,heading";

/// Number of comma-separated fields in one record (timestamp + columns)
pub const STREAM_FIELD_COUNT: usize = 13;

/// Message of the error reported when the server ends the stream
pub const STREAM_CLOSED: &str = "HTTP stream closed";

/// One telemetry snapshot
///
/// Fields the car leaves blank (e.g. `speed` and `shift_state` while parked)
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub timestamp: DateTime<Utc>,
    pub speed: Option<i32>,
    pub odometer: Option<f64>,
    /// State of charge, percent
    pub soc: Option<i32>,
    pub elevation: Option<i32>,
    pub est_heading: Option<i32>,
    pub est_lat: Option<f64>,
    pub est_lng: Option<f64>,
    pub power: Option<i32>,
    pub shift_state: Option<String>,
    pub range: Option<i32>,
    pub est_range: Option<i32>,
    pub heading: Option<i32>,
}

/// Errors that can occur during streaming
#[derive(Debug, Error)]
pub enum StreamError {
    /// HTTP/connection error
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// Failed to decode a record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Server returned an error
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The stream endpoint URL could not be built
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// Missing stream credentials
    #[error("Stream authentication unavailable: {0}")]
    Auth(String),

    /// Stream was closed by the server
    #[error("HTTP stream closed")]
    Closed,
}

impl StreamError {
    /// Whether this is the clean server-side close a caller may reconnect after
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Result type for streaming operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_sentinel_message() {
        assert_eq!(StreamError::Closed.to_string(), STREAM_CLOSED);
        assert!(StreamError::Closed.is_closed());
        assert!(!StreamError::Parse("x".into()).is_closed());
    }

    #[test]
    fn test_column_count_matches_field_count() {
        assert_eq!(STREAM_COLUMNS.split(',').count() + 1, STREAM_FIELD_COUNT);
    }
}
