//! Tesla owner API HTTP client implementation

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::command::CommandOutcome;
use crate::config::{ClientConfig, DEFAULT_STREAMING_URL};
use crate::error::{Result, TeslaClientError};
use crate::streaming::STREAM_COLUMNS;
use crate::types::*;
use crate::vehicle::VehicleHandle;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default capacity of the telemetry channels
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Parse a base URL so that relative joins append to its path.
///
/// `Url::join("vehicles")` on `https://host/api/1` would replace the `1`
/// segment; a trailing slash keeps it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Tesla owner API client
///
/// Cheap to clone; clones share the connection pool. Safe to use from many
/// tasks at once: command calls and telemetry readers hold no shared mutable
/// state.
#[derive(Debug, Clone)]
pub struct TeslaClient {
    client: Client,
    /// Used for telemetry streams only: no overall request timeout, since the
    /// response body stays open for as long as the car streams.
    stream_client: Client,
    base_url: Url,
    streaming_url: Url,
    email: Option<String>,
    channel_capacity: usize,
}

impl TeslaClient {
    /// Create a new client without credentials
    ///
    /// # Arguments
    /// * `base_url` - Owner API base URL (e.g., "https://owner-api.teslamotors.com/api/1")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        Self::build(
            base_url,
            DEFAULT_STREAMING_URL,
            None,
            timeout,
            connect_timeout,
        )
    }

    /// Create a new client that sends a bearer token with every request.
    ///
    /// The token is set as a default `Authorization: Bearer <token>` header.
    pub fn with_bearer_token(base_url: &str, token: &str) -> Result<Self> {
        Self::build(
            base_url,
            DEFAULT_STREAMING_URL,
            Some(token),
            DEFAULT_TIMEOUT,
            DEFAULT_CONNECT_TIMEOUT,
        )
    }

    /// Create a client from a [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut client = Self::build(
            &config.connection.base_url,
            &config.connection.streaming_url,
            config.connection.access_token.as_deref(),
            config.timeouts.request(),
            config.timeouts.connect(),
        )?;
        client.email = config.connection.email.clone();
        client.channel_capacity = config.stream.channel_capacity.max(1);
        Ok(client)
    }

    fn build(
        base_url: &str,
        streaming_url: &str,
        token: Option<&str>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = token {
            let header_value =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token)).map_err(
                    |e| TeslaClientError::Config(format!("Invalid auth token: {}", e)),
                )?;
            headers.insert(reqwest::header::AUTHORIZATION, header_value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .default_headers(headers.clone())
            .build()?;

        let stream_client = Client::builder()
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            stream_client,
            base_url: parse_base_url(base_url)?,
            streaming_url: parse_base_url(streaming_url)?,
            email: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        })
    }

    /// Use a different telemetry streaming host
    pub fn with_streaming_url(mut self, streaming_url: &str) -> Result<Self> {
        self.streaming_url = parse_base_url(streaming_url)?;
        Ok(self)
    }

    /// Set the account email used as the telemetry stream's basic-auth user
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the streaming URL
    pub fn streaming_url(&self) -> &Url {
        &self.streaming_url
    }

    /// Account email used for stream authentication, if configured
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Capacity of the telemetry event and error channels
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    /// Get a reference to the underlying HTTP client.
    ///
    /// Useful for making custom requests while reusing the client's
    /// connection pool and default headers (e.g., bearer token).
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn stream_http_client(&self) -> &Client {
        &self.stream_client
    }

    // =========================================================================
    // URL Construction
    // =========================================================================

    /// Resolve a path relative to the API base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(Into::into)
    }

    /// Resolve `/vehicles/{id}/{suffix}`
    pub fn vehicle_url(&self, id: i64, suffix: &str) -> Result<Url> {
        self.endpoint(&format!("vehicles/{}/{}", id, suffix))
    }

    /// Get the telemetry stream URL for a vehicle
    ///
    /// The stream is keyed by `vehicle_id`, not by the API `id`.
    pub fn stream_url(&self, vehicle_id: i64) -> Result<Url> {
        let mut url = self
            .streaming_url
            .join(&format!("stream/{}/", vehicle_id))?;
        url.set_query(Some(&format!("values={}", STREAM_COLUMNS)));
        Ok(url)
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    /// List all vehicles on the account
    #[instrument(skip(self))]
    pub async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
        let url = self.endpoint("vehicles")?;
        debug!("Listing vehicles from {}", url);

        let response = self.client.get(url).send().await?;
        self.handle_response::<VehicleList>(response)
            .await
            .map(|list| list.response)
    }

    /// Bind a vehicle record to this client for commands and state reads
    pub fn vehicle(&self, vehicle: Vehicle) -> VehicleHandle {
        VehicleHandle::new(self.clone(), vehicle)
    }

    // =========================================================================
    // Request Dispatch
    // =========================================================================

    /// GET a `{"response": T}` document and unwrap it
    pub(crate) async fn get_response<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        self.handle_response::<ApiResponse<T>>(response)
            .await
            .map(|r| r.response)
    }

    /// POST a command with no body
    pub(crate) async fn post_command(&self, url: Url) -> Result<CommandOutcome> {
        debug!("POST {}", url);
        self.dispatch_command(self.client.post(url)).await
    }

    /// POST a command with a JSON body
    pub(crate) async fn post_command_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<CommandOutcome> {
        debug!("POST {} (json body)", url);
        self.dispatch_command(self.client.post(url).json(body))
            .await
    }

    async fn dispatch_command(&self, request: RequestBuilder) -> Result<CommandOutcome> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.extract_error_from_status(response, status).await);
        }

        let body = response.bytes().await?;
        let outcome = CommandOutcome::from_body(body)?;
        if let CommandOutcome::Rejected(reason) = &outcome {
            debug!("Command rejected: {}", reason);
        }
        Ok(outcome)
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Handle response and deserialize JSON
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| TeslaClientError::ParseError(e.to_string()))
        } else {
            Err(self.extract_error_from_status(response, status).await)
        }
    }

    async fn extract_error_from_status(
        &self,
        response: reqwest::Response,
        status: StatusCode,
    ) -> TeslaClientError {
        // Try to parse error response body
        let message = match response.json::<ErrorResponse>().await {
            Ok(err) => err.error,
            Err(_) => format!("HTTP {}", status),
        };

        match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TeslaClientError::Timeout,
            _ => TeslaClientError::server_error(status.as_u16(), message),
        }
    }
}
