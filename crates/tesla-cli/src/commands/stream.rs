//! Stream command - live telemetry

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use tesla_client::{ReconnectPolicy, StreamEvent, VehicleHandle, STREAM_COLUMNS};

use crate::output::{csv_row, OutputContext, OutputFormat};

/// Print telemetry until Ctrl+C, reconnecting whenever the server closes
/// the stream
pub async fn stream(
    vehicle: &VehicleHandle,
    max_attempts: Option<u32>,
    ctx: &OutputContext,
) -> Result<()> {
    let policy = match max_attempts {
        Some(n) => ReconnectPolicy::default().with_max_attempts(n),
        None => ReconnectPolicy::default(),
    };

    ctx.info(&format!(
        "Streaming telemetry for vehicle {}...",
        vehicle.vehicle().vehicle_id
    ));
    ctx.info("Press Ctrl+C to stop");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let headers: Vec<&str> = std::iter::once("timestamp")
        .chain(STREAM_COLUMNS.split(','))
        .collect();
    if ctx.format == OutputFormat::Csv {
        println!("{}", headers.join(","));
    }

    let mut events = vehicle.reconnecting_stream(policy);

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            item = events.next() => {
                match item {
                    Some(Ok(event)) => print_event(&event, &headers, ctx),
                    Some(Err(e)) if e.is_closed() => {
                        ctx.warn("Stream closed and reconnect attempts exhausted");
                        break;
                    }
                    Some(Err(e)) => {
                        ctx.error(&format!("Stream error: {}", e));
                        return Err(e.into());
                    }
                    None => {
                        ctx.info("Stream ended");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {
                // Check running flag periodically
            }
        }
    }

    ctx.success("Stopped");
    Ok(())
}

fn print_event(event: &StreamEvent, headers: &[&str], ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(event) {
                println!("{}", json);
            }
        }
        OutputFormat::Csv => {
            if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(event) {
                println!("{}", csv_row(headers, &row));
            }
        }
        OutputFormat::Table => {
            let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
            println!(
                "[{}] speed={} soc={}% range={} power={} shift={} at {},{}",
                event.timestamp.format("%H:%M:%S%.3f"),
                show(event.speed.map(|s| s.to_string())),
                show(event.soc.map(|s| s.to_string())),
                show(event.range.map(|r| r.to_string())),
                show(event.power.map(|p| p.to_string())),
                show(event.shift_state.clone()),
                show(event.est_lat.map(|l| l.to_string())),
                show(event.est_lng.map(|l| l.to_string())),
            );
        }
    }
}
