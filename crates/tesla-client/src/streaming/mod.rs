//! Live telemetry streaming
//!
//! Each vehicle exposes a long-lived HTTP stream of comma-separated records.
//! [`EventStream`] reads it on a background task and hands out decoded
//! [`StreamEvent`]s and faults on two channels. A clean close by the server is
//! reported as [`StreamError::Closed`] so callers can reconnect;
//! [`ReconnectingStream`] does that for them under a [`ReconnectPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use tesla_client::{ReconnectPolicy, TeslaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TeslaClient::with_bearer_token("https://owner-api.teslamotors.com/api/1", "token")?
//!     .with_email("driver@example.com");
//! let vehicle = client.vehicle(client.list_vehicles().await?.remove(0));
//!
//! let mut events = vehicle.reconnecting_stream(ReconnectPolicy::default().with_max_attempts(5));
//! while let Some(event) = events.next().await {
//!     match event {
//!         Ok(event) => println!("{} soc={:?}", event.timestamp, event.soc),
//!         Err(e) => {
//!             eprintln!("Stream error: {}", e);
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod consumer;
mod parser;
mod reconnect;
mod types;

pub use consumer::EventStream;
pub use parser::{parse_record, RecordParser};
pub use reconnect::{ReconnectPolicy, ReconnectingStream};
pub(crate) use reconnect::reconnecting;
pub use types::{
    StreamError, StreamEvent, StreamResult, STREAM_CLOSED, STREAM_COLUMNS, STREAM_FIELD_COUNT,
};
