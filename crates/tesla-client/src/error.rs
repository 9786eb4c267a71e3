//! Error types for Tesla client operations

use thiserror::Error;

/// Result type alias for Tesla client operations
pub type Result<T> = std::result::Result<T, TeslaClientError>;

/// Errors that can occur during Tesla client operations
#[derive(Error, Debug)]
pub enum TeslaClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned a non-success status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The vehicle refused the command. Displays the server's reason verbatim.
    #[error("{0}")]
    CommandFailed(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,

    /// The vehicle did not report a coordinate
    #[error("Vehicle did not report its location")]
    NoLocation,

    /// Streaming error
    #[error("Stream error: {0}")]
    StreamError(#[from] crate::streaming::StreamError),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TeslaClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    /// The reason string reported by the vehicle, if the command was refused
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::CommandFailed(reason) => Some(reason),
            _ => None,
        }
    }
}
