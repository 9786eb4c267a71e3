//! Reconnect policy for telemetry streams

use std::time::Duration;

use futures::stream::BoxStream;
use tracing::{info, warn};

use super::types::{StreamEvent, StreamResult};
use crate::vehicle::VehicleHandle;

/// Stream of telemetry that re-opens the connection after clean closes
pub type ReconnectingStream = BoxStream<'static, StreamResult<StreamEvent>>;

/// When and how often to re-open a stream after the server closes it
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Consecutive reconnects allowed before giving up; `None` is unbounded
    pub max_attempts: Option<u32>,
    /// Delay before the first reconnect
    pub initial_backoff: Duration,
    /// Upper bound for any delay
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl ReconnectPolicy {
    /// Never reconnect; the closure is passed through as the last item
    pub fn never() -> Self {
        Self {
            max_attempts: Some(0),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Delay before reconnect number `attempt` (1-based), or `None` once
    /// the attempts are used up
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || self.max_attempts.is_some_and(|max| attempt > max) {
            return None;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);

        if !secs.is_finite() || secs >= self.max_backoff.as_secs_f64() {
            Some(self.max_backoff)
        } else {
            Some(Duration::from_secs_f64(secs.max(0.0)))
        }
    }
}

pub(crate) fn reconnecting(vehicle: VehicleHandle, policy: ReconnectPolicy) -> ReconnectingStream {
    Box::pin(async_stream::stream! {
        let mut stream = match vehicle.stream().await {
            Ok(stream) => stream,
            Err(e) => {
                yield Err(e);
                return;
            }
        };
        let mut attempt: u32 = 0;

        loop {
            match stream.recv().await {
                Some(Ok(event)) => {
                    attempt = 0;
                    yield Ok(event);
                }
                Some(Err(err)) if err.is_closed() => {
                    let mut last_error = err;
                    loop {
                        attempt += 1;
                        let Some(delay) = policy.delay_for(attempt) else {
                            yield Err(last_error);
                            return;
                        };

                        info!(attempt, ?delay, "Telemetry stream closed, reconnecting");
                        tokio::time::sleep(delay).await;

                        match vehicle.stream().await {
                            Ok(reopened) => {
                                stream = reopened;
                                break;
                            }
                            Err(e) => {
                                warn!(attempt, "Reconnect failed: {}", e);
                                last_error = e;
                            }
                        }
                    }
                }
                Some(Err(err)) => {
                    yield Err(err);
                    return;
                }
                None => return,
            }
        }
    })
}
