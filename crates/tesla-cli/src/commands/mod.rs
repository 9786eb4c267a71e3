//! Command implementations for tesla-cli

pub mod control;
pub mod state;
pub mod stream;
pub mod vehicles;

pub use control::{autopark, charge, climate, roof, simple, start, trunk, update, Simple};
pub use state::state;
pub use stream::stream;
pub use vehicles::{vehicles, wake};

use anyhow::{bail, Result};
use tesla_client::{TeslaClient, Vehicle, VehicleHandle};

/// Resolve the vehicle to act on.
///
/// `selector` matches the API id, the VIN or the display name; without one
/// the account must have exactly one vehicle.
pub fn select_vehicle(vehicles: Vec<Vehicle>, selector: Option<&str>) -> Result<Vehicle> {
    match selector {
        Some(sel) => {
            let found = vehicles.into_iter().find(|v| {
                v.id.to_string() == sel
                    || v.vin.eq_ignore_ascii_case(sel)
                    || v.display_name.as_deref() == Some(sel)
            });
            match found {
                Some(v) => Ok(v),
                None => bail!("No vehicle matches '{}'", sel),
            }
        }
        None => {
            if vehicles.len() > 1 {
                bail!(
                    "Account has {} vehicles; choose one with --vehicle",
                    vehicles.len()
                );
            }
            match vehicles.into_iter().next() {
                Some(v) => Ok(v),
                None => bail!("No vehicles on this account"),
            }
        }
    }
}

/// List the account's vehicles and bind the selected one to the client
pub async fn resolve_vehicle(client: &TeslaClient, selector: Option<&str>) -> Result<VehicleHandle> {
    let vehicles = client.list_vehicles().await?;
    let vehicle = select_vehicle(vehicles, selector)?;
    tracing::debug!(id = vehicle.id, vin = %vehicle.vin, "Selected vehicle");
    Ok(client.vehicle(vehicle))
}
