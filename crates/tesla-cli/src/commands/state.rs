//! State command - read one of the vehicle's data sets

use anyhow::Result;
use clap::ValueEnum;
use tesla_client::VehicleHandle;

use crate::output::OutputContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateKind {
    Charge,
    Climate,
    Drive,
    Gui,
    Vehicle,
    /// Whether mobile access is enabled
    Mobile,
}

pub async fn state(vehicle: &VehicleHandle, kind: StateKind, ctx: &OutputContext) -> Result<()> {
    match kind {
        StateKind::Charge => ctx.print_record(&vehicle.charge_state().await?),
        StateKind::Climate => ctx.print_record(&vehicle.climate_state().await?),
        StateKind::Drive => ctx.print_record(&vehicle.drive_state().await?),
        StateKind::Gui => ctx.print_record(&vehicle.gui_settings().await?),
        StateKind::Vehicle => ctx.print_record(&vehicle.vehicle_state().await?),
        StateKind::Mobile => {
            let enabled = vehicle.mobile_enabled().await?;
            ctx.print_kv(&[("mobile_enabled", enabled.to_string())]);
        }
    }
    Ok(())
}
