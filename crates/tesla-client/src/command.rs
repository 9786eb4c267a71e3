//! Command response envelope
//!
//! Every command answers with `{"response": {"result": bool, "reason": string}}`,
//! or with no body at all. [`CommandOutcome`] makes the three cases explicit so
//! an empty body can't be confused with a decoded success payload.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TeslaClientError};

/// Wire form of the command envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(default)]
    pub response: CommandResult,
}

/// Inner `response` object of the envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub reason: String,
}

/// Interpreted result of a command call
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The server sent no body
    Empty,
    /// The envelope decoded and was not a refusal; the raw body is kept
    /// for commands that carry a typed payload (e.g. `wake_up`)
    Accepted(Bytes),
    /// `result` was false with a non-empty reason
    Rejected(String),
}

impl CommandOutcome {
    /// Interpret a response body.
    ///
    /// Only a malformed body is an error here; a refusal is a valid outcome.
    /// `result: false` with an empty reason counts as accepted.
    pub fn from_body(body: Bytes) -> Result<Self> {
        if body.is_empty() {
            return Ok(Self::Empty);
        }

        let envelope: CommandEnvelope = serde_json::from_slice(&body)
            .map_err(|e| TeslaClientError::ParseError(e.to_string()))?;

        if !envelope.response.result && !envelope.response.reason.is_empty() {
            Ok(Self::Rejected(envelope.response.reason))
        } else {
            Ok(Self::Accepted(body))
        }
    }

    /// Whether the vehicle accepted the command
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }

    /// Convert into a `Result`, yielding the body (if any) on success
    pub fn into_result(self) -> Result<Option<Bytes>> {
        match self {
            Self::Empty => Ok(None),
            Self::Accepted(body) => Ok(Some(body)),
            Self::Rejected(reason) => Err(TeslaClientError::CommandFailed(reason)),
        }
    }
}
