//! Test utilities for tesla-client
//!
//! Provides a scriptable mock of the owner API and streaming host, served on
//! an ephemeral local port.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::{ClientConfig, Result, TeslaClient, Vehicle};

/// Path prefix the mock serves the owner API under
pub const API_PREFIX: &str = "/api/1";
/// Bearer token the test client sends
pub const TEST_TOKEN: &str = "test-access-token";
/// Account email the test client uses for stream authentication
pub const TEST_EMAIL: &str = "driver@example.com";

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: TeslaClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve an axum Router and build a client pointed at it.
    ///
    /// The owner API is expected under [`API_PREFIX`]; the streaming host is
    /// the server root.
    pub async fn start<S>(router: axum::Router<S>) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2)).await
    }

    /// Create a new test server with custom timeouts
    pub async fn start_with_timeout<S>(
        router: axum::Router<S>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let router: axum::Router = router.into();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let config = ClientConfig::builder(format!("http://{}{}", addr, API_PREFIX))
            .streaming_url(format!("http://{}", addr))
            .access_token(TEST_TOKEN)
            .email(TEST_EMAIL)
            .request_timeout_ms(timeout.as_millis() as u64)
            .connect_timeout_ms(connect_timeout.as_millis() as u64)
            .build();
        let client = TeslaClient::from_config(&config)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the owner API base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    /// Get the streaming URL of the test server
    pub fn streaming_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a reference to the client
    pub fn client(&self) -> &TeslaClient {
        &self.client
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// Mock owner API
// =============================================================================

/// A request as the mock received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Bytes,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// Body decoded as JSON, if it is JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Decoded query parameters, in order
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: StatusCode,
    body: String,
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, CannedResponse>,
    stream_chunks: Vec<Bytes>,
    requests: Vec<RecordedRequest>,
}

/// Scriptable stand-in for the owner API and streaming host.
///
/// Every request is recorded. Unscripted command paths answer with a success
/// envelope, stream paths answer with the scripted stream body (empty by
/// default, which the client sees as an immediate close) and anything else
/// is a 404.
#[derive(Debug, Clone, Default)]
pub struct MockVehicleApi {
    state: Arc<Mutex<MockState>>,
}

/// Absolute mock path of a vehicle endpoint, e.g. `vehicle_path(321, "wake_up")`
pub fn vehicle_path(id: i64, suffix: &str) -> String {
    format!("{}/vehicles/{}/{}", API_PREFIX, id, suffix)
}

/// Absolute mock path of a vehicle command
pub fn command_path(id: i64, command: &str) -> String {
    vehicle_path(id, &format!("command/{}", command))
}

/// A vehicle record suitable for most tests
pub fn test_vehicle() -> Vehicle {
    Vehicle {
        id: 321,
        vehicle_id: 123,
        vin: "5YJSA1CN5DFP00101".into(),
        display_name: Some("Test Car".into()),
        tokens: vec!["stream-token-1".into(), "stream-token-2".into()],
        state: Some("online".into()),
        ..Default::default()
    }
}

impl MockVehicleApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` with a fixed status and body
    pub fn respond(&self, path: impl Into<String>, status: u16, body: impl Into<String>) -> &Self {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state.lock().responses.insert(
            path.into(),
            CannedResponse {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Answer `path` with `200` and a JSON document
    pub fn respond_json(&self, path: impl Into<String>, value: serde_json::Value) -> &Self {
        self.respond(path, 200, value.to_string())
    }

    /// Serve `vehicles` from the vehicle list endpoint
    pub fn set_vehicles(&self, vehicles: &[Vehicle]) -> &Self {
        let body = serde_json::json!({ "response": vehicles, "count": vehicles.len() });
        self.respond_json(format!("{}/vehicles", API_PREFIX), body)
    }

    /// Serve each line, newline-terminated, as its own chunk of the stream body
    pub fn set_stream(&self, lines: &[&str]) -> &Self {
        let chunks = lines
            .iter()
            .map(|line| Bytes::from(format!("{}\n", line)))
            .collect();
        self.set_stream_chunks(chunks)
    }

    /// Serve raw chunks as the stream body
    pub fn set_stream_chunks(&self, chunks: Vec<Bytes>) -> &Self {
        self.state.lock().stream_chunks = chunks;
        self
    }

    /// Everything received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests received for one path
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Requests made to the streaming endpoint
    pub fn stream_requests(&self) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.path.starts_with("/stream/"))
            .cloned()
            .collect()
    }

    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .fallback(handle_request)
            .with_state(self.clone())
    }

    /// Serve this mock on an ephemeral port
    pub async fn serve(&self) -> Result<TestServer> {
        TestServer::start(self.router()).await
    }
}

async fn handle_request(
    State(api): State<MockVehicleApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut state = api.state.lock();
    state.requests.push(RecordedRequest {
        method,
        path: path.clone(),
        query: uri.query().map(str::to_string),
        body,
        authorization,
    });

    if let Some(canned) = state.responses.get(&path) {
        return (
            canned.status,
            [(header::CONTENT_TYPE, "application/json")],
            canned.body.clone(),
        )
            .into_response();
    }

    if path.starts_with("/stream/") {
        let chunks = state.stream_chunks.clone();
        let body = Body::from_stream(futures::stream::iter(
            chunks.into_iter().map(Ok::<_, std::convert::Infallible>),
        ));
        return (StatusCode::OK, body).into_response();
    }

    if path.contains("/command/") || path.ends_with("/wake_up") {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"response":{"result":true,"reason":""}}"#,
        )
            .into_response();
    }

    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"error":"not found"}"#,
    )
        .into_response()
}

/// Wait for a condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    false
}
