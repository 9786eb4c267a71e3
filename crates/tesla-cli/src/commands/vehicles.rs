//! Vehicles and wake commands

use anyhow::{Context, Result};
use tesla_client::{TeslaClient, VehicleHandle};

use crate::output::{OutputContext, VehicleRow};

/// List the vehicles on the account
pub async fn vehicles(client: &TeslaClient, ctx: &OutputContext) -> Result<()> {
    let vehicles = client.list_vehicles().await?;
    let rows: Vec<VehicleRow> = vehicles.iter().map(VehicleRow::from).collect();
    ctx.print(&rows);
    Ok(())
}

/// Wake the vehicle and show its refreshed record
pub async fn wake(vehicle: &VehicleHandle, ctx: &OutputContext) -> Result<()> {
    let woken = vehicle.wake_up().await.context("wake_up failed")?;
    ctx.print(&[VehicleRow::from(&woken)]);
    Ok(())
}
