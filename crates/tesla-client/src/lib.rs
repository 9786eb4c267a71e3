//! Tesla Client Library
//!
//! Typed HTTP client for the Tesla owner API: vehicle commands, state reads
//! and the live telemetry stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use tesla_client::TeslaClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TeslaClient::with_bearer_token(
//!         "https://owner-api.teslamotors.com/api/1",
//!         "access-token",
//!     )?;
//!
//!     // Pick the first car on the account
//!     let vehicle = client.vehicle(client.list_vehicles().await?.remove(0));
//!
//!     vehicle.wake_up().await?;
//!     vehicle.set_temperature(21.0, 21.5).await?;
//!
//!     // A refused command carries the vehicle's reason
//!     if let Err(e) = vehicle.honk_horn().await {
//!         println!("honk refused: {}", e);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Telemetry
//!
//! [`VehicleHandle::stream`] opens the streaming endpoint and delivers
//! [`StreamEvent`]s on a channel, with faults on a second channel. See the
//! [`streaming`] module.
//!
//! # Testing
//!
//! The `testing` module provides a scriptable mock of the owner API:
//!
//! ```rust,ignore
//! use tesla_client::testing::MockVehicleApi;
//!
//! let api = MockVehicleApi::new();
//! let server = api.serve().await?;
//! let vehicles = server.client.list_vehicles().await?;
//! ```

mod client;
mod command;
mod config;
mod error;
pub mod streaming;
pub mod testing;
mod types;
mod vehicle;

pub use client::TeslaClient;
pub use command::{CommandEnvelope, CommandOutcome, CommandResult};
pub use config::{
    ClientConfig, ClientConfigBuilder, ConfigError, ConnectionConfig, StreamConfig,
    TimeoutsConfig, DEFAULT_BASE_URL, DEFAULT_STREAMING_URL,
};
pub use error::{Result, TeslaClientError};
pub use types::*;
pub use vehicle::VehicleHandle;

// Re-export streaming types for convenience
pub use streaming::{
    EventStream, ReconnectPolicy, ReconnectingStream, StreamError, StreamEvent, StreamResult,
    STREAM_CLOSED, STREAM_COLUMNS,
};
