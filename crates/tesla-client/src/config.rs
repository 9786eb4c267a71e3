//! Client configuration with YAML support

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default owner API base URL
pub const DEFAULT_BASE_URL: &str = "https://owner-api.teslamotors.com/api/1";
/// Default telemetry streaming URL
pub const DEFAULT_STREAMING_URL: &str = "https://streaming.vn.teslamotors.com";

/// Tesla client configuration
///
/// Can be loaded from YAML, JSON, or constructed programmatically:
///
/// ```yaml
/// connection:
///   base_url: "https://owner-api.teslamotors.com/api/1"
///   streaming_url: "https://streaming.vn.teslamotors.com"
///   access_token: "abc123"
///   email: "driver@example.com"
///
/// timeouts:
///   request_ms: 30000
///   connect_ms: 10000
///
/// stream:
///   channel_capacity: 64
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Telemetry stream settings
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Owner API base URL (commands and state reads)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Streaming host for live telemetry
    #[serde(default = "default_streaming_url")]
    pub streaming_url: String,

    /// OAuth access token sent as a bearer token
    #[serde(default)]
    pub access_token: Option<String>,

    /// Account email, used as the basic-auth user of the telemetry stream
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            streaming_url: default_streaming_url(),
            access_token: None,
            email: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_streaming_url() -> String {
    DEFAULT_STREAMING_URL.to_string()
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// General request timeout in milliseconds (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,

    /// Connect timeout in milliseconds (default: 10s)
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_ms: default_request_timeout(),
            connect_ms: default_connect_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30_000 // 30 seconds
}

fn default_connect_timeout() -> u64 {
    10_000 // 10 seconds
}

impl TimeoutsConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

/// Telemetry stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Capacity of the event and error channels
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Create a builder for programmatic configuration
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url)
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with the given API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut config = ClientConfig::default();
        config.connection.base_url = base_url.into();
        Self { config }
    }

    /// Set the streaming URL
    pub fn streaming_url(mut self, url: impl Into<String>) -> Self {
        self.config.connection.streaming_url = url.into();
        self
    }

    /// Set the bearer access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.connection.access_token = Some(token.into());
        self
    }

    /// Set the account email used for stream authentication
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.config.connection.email = Some(email.into());
        self
    }

    /// Set request timeout in milliseconds
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.request_ms = ms;
        self
    }

    /// Set connect timeout in milliseconds
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.connect_ms = ms;
        self
    }

    /// Set the capacity of the stream channels
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.stream.channel_capacity = capacity;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
