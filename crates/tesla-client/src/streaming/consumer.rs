//! Telemetry stream reader

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use super::parser::RecordParser;
use super::types::{StreamError, StreamEvent, StreamResult};

/// An open telemetry stream
///
/// A background task reads the connection and delivers decoded records on
/// `events`, in the order received. Faults go to `errors`; the reader sends
/// exactly one error and then exits, so nothing arrives on `events` after
/// it. A clean close by the server is [`StreamError::Closed`].
///
/// The reader is not restarted and has no cancellation handle of its own:
/// it stops when the connection ends, or when both receivers have been
/// dropped and its next send fails.
///
/// # Example
///
/// ```ignore
/// let mut stream = vehicle.stream().await?;
/// loop {
///     tokio::select! {
///         Some(event) = stream.events.recv() => println!("{:?}", event),
///         Some(err) = stream.errors.recv() => {
///             if err.is_closed() {
///                 stream = vehicle.stream().await?;
///             } else {
///                 return Err(err.into());
///             }
///         }
///     }
/// }
/// ```
#[derive(Debug)]
pub struct EventStream {
    pub events: mpsc::Receiver<StreamEvent>,
    pub errors: mpsc::Receiver<StreamError>,
    reader: JoinHandle<()>,
}

impl EventStream {
    /// Open the stream and spawn its reader
    pub(crate) async fn connect(
        http_client: &Client,
        url: Url,
        email: &str,
        token: &str,
        capacity: usize,
    ) -> StreamResult<Self> {
        debug!("Connecting to telemetry stream: {}", url);

        let response = http_client
            .get(url)
            .basic_auth(email, Some(token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StreamError::Server { status, message });
        }

        Ok(Self::spawn(response.bytes_stream(), capacity))
    }

    /// Spawn a reader over any byte stream
    pub fn spawn<S, E>(byte_stream: S, capacity: usize) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<StreamError> + Send + 'static,
    {
        let (event_tx, events) = mpsc::channel(capacity.max(1));
        let (error_tx, errors) = mpsc::channel(1);

        let reader = tokio::spawn(read_loop(Box::pin(byte_stream), event_tx, error_tx));

        Self {
            events,
            errors,
            reader,
        }
    }

    /// Receive the next event or the terminal error.
    ///
    /// Buffered events are always returned before the error that followed
    /// them. Returns `None` once both channels are drained and closed.
    pub async fn recv(&mut self) -> Option<StreamResult<StreamEvent>> {
        tokio::select! {
            biased;
            Some(event) = self.events.recv() => Some(Ok(event)),
            Some(err) = self.errors.recv() => Some(Err(err)),
            else => None,
        }
    }

    /// Whether the background reader has exited
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished()
    }
}

async fn read_loop<S, E>(
    mut byte_stream: S,
    events: mpsc::Sender<StreamEvent>,
    errors: mpsc::Sender<StreamError>,
) where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<StreamError>,
{
    let mut parser = RecordParser::new();

    let fault = 'read: loop {
        let records = match byte_stream.next().await {
            Some(Ok(chunk)) => parser.feed(&chunk),
            Some(Err(e)) => break e.into(),
            None => {
                // A final record may arrive without its newline
                match parser.finish() {
                    Some(Ok(event)) => {
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => break e,
                    None => {}
                }
                break StreamError::Closed;
            }
        };

        for record in records {
            match record {
                Ok(event) => {
                    if events.send(event).await.is_err() {
                        debug!("Telemetry receiver dropped, stopping reader");
                        return;
                    }
                }
                Err(e) => break 'read e,
            }
        }
    };

    if fault.is_closed() {
        debug!("Telemetry stream closed by server");
    } else {
        warn!("Telemetry stream failed: {}", fault);
    }
    let _ = errors.send(fault).await;
}
