//! Telemetry record parser
//!
//! The streaming endpoint sends one comma-separated record per line:
//! `timestamp_ms,speed,odometer,soc,elevation,est_heading,est_lat,est_lng,power,shift_state,range,est_range,heading`

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::trace;

use super::types::{StreamError, StreamEvent, StreamResult, STREAM_FIELD_COUNT};

/// Line-splitting parser state
#[derive(Debug, Default)]
pub struct RecordParser {
    /// Buffer for an incomplete trailing line
    buffer: Vec<u8>,
}

impl RecordParser {
    /// Create a new record parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and extract any complete records
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamResult<StreamEvent>> {
        let mut events = Vec::new();

        self.buffer.extend_from_slice(bytes);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<_>>();
            if let Some(event) = Self::process_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }

        events
    }

    /// Decode whatever is left once the connection has ended
    pub fn finish(&mut self) -> Option<StreamResult<StreamEvent>> {
        let line = std::mem::take(&mut self.buffer);
        Self::process_line(&line)
    }

    fn process_line(line: &[u8]) -> Option<StreamResult<StreamEvent>> {
        // Handle \r\n line endings
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        let line = match std::str::from_utf8(line) {
            Ok(s) => s.trim(),
            Err(_) => {
                return Some(Err(StreamError::Parse(
                    "Invalid UTF-8 in stream record".into(),
                )))
            }
        };

        if line.is_empty() {
            trace!("Skipping blank stream line");
            return None;
        }

        Some(parse_record(line))
    }
}

/// Decode a single record
pub fn parse_record(line: &str) -> StreamResult<StreamEvent> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != STREAM_FIELD_COUNT {
        return Err(StreamError::Parse(format!(
            "expected {} fields, got {} (record: {})",
            STREAM_FIELD_COUNT,
            fields.len(),
            preview(line)
        )));
    }

    let millis: i64 = parse_field("timestamp", fields[0])?
        .ok_or_else(|| StreamError::Parse("missing timestamp".into()))?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| StreamError::Parse(format!("timestamp out of range: {}", millis)))?;

    Ok(StreamEvent {
        timestamp,
        speed: parse_field("speed", fields[1])?,
        odometer: parse_field("odometer", fields[2])?,
        soc: parse_field("soc", fields[3])?,
        elevation: parse_field("elevation", fields[4])?,
        est_heading: parse_field("est_heading", fields[5])?,
        est_lat: parse_field("est_lat", fields[6])?,
        est_lng: parse_field("est_lng", fields[7])?,
        power: parse_field("power", fields[8])?,
        shift_state: Some(fields[9].trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        range: parse_field("range", fields[10])?,
        est_range: parse_field("est_range", fields[11])?,
        heading: parse_field("heading", fields[12])?,
    })
}

/// Empty fields are `None`; anything else must parse
fn parse_field<T: FromStr>(name: &str, raw: &str) -> StreamResult<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| StreamError::Parse(format!("invalid {}: {:?}", name, raw)))
}

fn preview(line: &str) -> String {
    if line.len() > 100 {
        let cut = (0..=100).rev().find(|&i| line.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &line[..cut])
    } else {
        line.to_string()
    }
}
