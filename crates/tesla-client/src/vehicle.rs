//! Per-vehicle commands and state reads
//!
//! Each command is exactly one POST to `/vehicles/{id}/command/{name}` (or
//! `/vehicles/{id}/wake_up`). Arguments are passed through untouched: the
//! server, not the client, rejects out-of-range percentages or unknown tags.

use serde::Serialize;
use tracing::instrument;
use url::Url;

use crate::client::TeslaClient;
use crate::error::{Result, TeslaClientError};
use crate::streaming::{EventStream, ReconnectPolicy, ReconnectingStream, StreamError, StreamResult};
use crate::types::*;

/// Render a temperature the way the API expects it in a query string:
/// shortest single-precision form, so `72.0` becomes `72`.
fn format_temperature(value: f64) -> String {
    (value as f32).to_string()
}

/// A vehicle bound to the client that issues its commands
#[derive(Debug, Clone)]
pub struct VehicleHandle {
    client: TeslaClient,
    vehicle: Vehicle,
}

impl VehicleHandle {
    pub fn new(client: TeslaClient, vehicle: Vehicle) -> Self {
        Self { client, vehicle }
    }

    /// The vehicle record this handle was created from
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// API identifier used in every command path
    pub fn id(&self) -> i64 {
        self.vehicle.id
    }

    pub fn client(&self) -> &TeslaClient {
        &self.client
    }

    /// URL of a named command for this vehicle
    pub fn command_url(&self, command: &str) -> Result<Url> {
        self.client
            .vehicle_url(self.vehicle.id, &format!("command/{}", command))
    }

    async fn command(&self, command: &str) -> Result<()> {
        let url = self.command_url(command)?;
        self.client.post_command(url).await?.into_result()?;
        Ok(())
    }

    async fn command_json<B: Serialize + ?Sized>(&self, command: &str, body: &B) -> Result<()> {
        let url = self.command_url(command)?;
        self.client.post_command_json(url, body).await?.into_result()?;
        Ok(())
    }

    async fn command_with_query(&self, command: &str, query: &[(&str, &str)]) -> Result<()> {
        let mut url = self.command_url(command)?;
        url.query_pairs_mut().extend_pairs(query);
        self.client.post_command(url).await?.into_result()?;
        Ok(())
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Whether mobile access is enabled for the vehicle
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn mobile_enabled(&self) -> Result<bool> {
        let url = self.client.vehicle_url(self.vehicle.id, "mobile_enabled")?;
        self.client.get_response(url).await
    }

    async fn data_request<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let url = self
            .client
            .vehicle_url(self.vehicle.id, &format!("data_request/{}", name))?;
        self.client.get_response(url).await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn charge_state(&self) -> Result<ChargeState> {
        self.data_request("charge_state").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn climate_state(&self) -> Result<ClimateState> {
        self.data_request("climate_state").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn drive_state(&self) -> Result<DriveState> {
        self.data_request("drive_state").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn gui_settings(&self) -> Result<GuiSettings> {
        self.data_request("gui_settings").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn vehicle_state(&self) -> Result<VehicleState> {
        self.data_request("vehicle_state").await
    }

    // =========================================================================
    // Power
    // =========================================================================

    /// Wake the vehicle and return its refreshed record
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn wake_up(&self) -> Result<Vehicle> {
        let url = self.client.vehicle_url(self.vehicle.id, "wake_up")?;
        let body = self
            .client
            .post_command(url)
            .await?
            .into_result()?
            .ok_or_else(|| TeslaClientError::ParseError("empty wake_up response".into()))?;

        serde_json::from_slice::<ApiResponse<Vehicle>>(&body)
            .map(|r| r.response)
            .map_err(|e| TeslaClientError::ParseError(e.to_string()))
    }

    /// Enable keyless driving. The account password is sent as a query parameter.
    #[instrument(skip(self, password), fields(vehicle = self.vehicle.id))]
    pub async fn start(&self, password: &str) -> Result<()> {
        self.command_with_query("remote_start_drive", &[("password", password)])
            .await
    }

    // =========================================================================
    // Charging
    // =========================================================================

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn open_charge_port(&self) -> Result<()> {
        self.command("charge_port_door_open").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn close_charge_port(&self) -> Result<()> {
        self.command("charge_port_door_close").await
    }

    /// Set the charge limit to the standard setting
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn set_charge_limit_standard(&self) -> Result<()> {
        self.command("charge_standard").await
    }

    /// Set the charge limit to maximum range
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn set_charge_limit_max(&self) -> Result<()> {
        self.command("charge_max_range").await
    }

    /// Set the charge limit to a custom percentage
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn set_charge_limit(&self, percent: i32) -> Result<()> {
        self.command_json("set_charge_limit", &ChargeLimitRequest { percent })
            .await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn start_charging(&self) -> Result<()> {
        self.command("charge_start").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn stop_charging(&self) -> Result<()> {
        self.command("charge_stop").await
    }

    // =========================================================================
    // Software Updates
    // =========================================================================

    /// Schedule installation of an already-downloaded update `offset_sec`
    /// seconds from now
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn schedule_software_update(&self, offset_sec: i64) -> Result<()> {
        self.command_json(
            "schedule_software_update",
            &SoftwareUpdateRequest { offset_sec },
        )
        .await
    }

    /// Cancel a scheduled update that has not started yet
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn cancel_software_update(&self) -> Result<()> {
        self.command("cancel_software_update").await
    }

    // =========================================================================
    // Security
    // =========================================================================

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn lock_doors(&self) -> Result<()> {
        self.command("door_lock").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn unlock_doors(&self) -> Result<()> {
        self.command("door_unlock").await
    }

    /// Clear the valet mode PIN, if one is set
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn reset_valet_pin(&self) -> Result<()> {
        self.command("reset_valet_pin").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn sentry_mode_enable(&self) -> Result<()> {
        self.set_sentry_mode(true).await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn sentry_mode_disable(&self) -> Result<()> {
        self.set_sentry_mode(false).await
    }

    async fn set_sentry_mode(&self, on: bool) -> Result<()> {
        self.command_json("set_sentry_mode", &SentryModeRequest { on })
            .await
    }

    // =========================================================================
    // Alerts
    // =========================================================================

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn flash_lights(&self) -> Result<()> {
        self.command("flash_lights").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn honk_horn(&self) -> Result<()> {
        self.command("honk_horn").await
    }

    // =========================================================================
    // Climate
    // =========================================================================

    /// Set driver and passenger zone temperatures (°C)
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn set_temperature(&self, driver: f64, passenger: f64) -> Result<()> {
        let driver = format_temperature(driver);
        let passenger = format_temperature(passenger);
        self.command_with_query(
            "set_temps",
            &[("driver_temp", driver.as_str()), ("passenger_temp", passenger.as_str())],
        )
        .await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn start_air_conditioning(&self) -> Result<()> {
        self.command("auto_conditioning_start").await
    }

    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn stop_air_conditioning(&self) -> Result<()> {
        self.command("auto_conditioning_stop").await
    }

    // =========================================================================
    // Body
    // =========================================================================

    /// Move the panoramic roof.
    ///
    /// `state` is one of `open` (~100%), `close` (0%), `comfort` (~80%),
    /// `vent` (~15%) or `move`, which uses `percent`.
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn move_pano_roof(&self, state: &str, percent: i32) -> Result<()> {
        let body = SunRoofRequest {
            state: state.to_string(),
            percent,
        };
        self.command_json("sun_roof_control", &body).await
    }

    /// Open a trunk; `which` is `front` or `rear`
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn open_trunk(&self, which: &str) -> Result<()> {
        let body = TrunkRequest {
            which_trunk: which.to_string(),
        };
        self.command_json("trunk_open", &body).await
    }

    // =========================================================================
    // Autopark / Homelink
    // =========================================================================

    /// Abort a running summon at the vehicle's current position
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn autopark_abort(&self) -> Result<()> {
        self.autopark(AutoParkAction::Abort).await
    }

    /// Pull forward from the vehicle's current position
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn autopark_forward(&self) -> Result<()> {
        self.autopark(AutoParkAction::StartForward).await
    }

    /// Reverse from the vehicle's current position
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn autopark_reverse(&self) -> Result<()> {
        self.autopark(AutoParkAction::StartReverse).await
    }

    /// Reads the drive state for the coordinate first. A failed read, or a
    /// state without a coordinate, is returned as an error and no command
    /// is sent.
    async fn autopark(&self, action: AutoParkAction) -> Result<()> {
        let location = self.current_location().await?;
        self.autopark_at(action, location).await
    }

    async fn current_location(&self) -> Result<Location> {
        self.drive_state()
            .await?
            .location()
            .ok_or(TeslaClientError::NoLocation)
    }

    /// Send an autopark request with a caller-supplied coordinate
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn autopark_at(&self, action: AutoParkAction, location: Location) -> Result<()> {
        let body = AutoParkRequest::autopark(self.vehicle.vehicle_id, location, action);
        self.command_json("autopark_request", &body).await
    }

    /// Toggle the Homelink device at the vehicle's current position.
    ///
    /// Homelink is a toggle; the door's resulting state is unknown.
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn trigger_homelink(&self) -> Result<()> {
        let location = self.current_location().await?;
        self.trigger_homelink_at(location).await
    }

    /// Toggle Homelink with a caller-supplied coordinate
    #[instrument(skip(self), fields(vehicle = self.vehicle.id))]
    pub async fn trigger_homelink_at(&self, location: Location) -> Result<()> {
        self.command_json("trigger_homelink", &AutoParkRequest::homelink(location))
            .await
    }

    // =========================================================================
    // Telemetry
    // =========================================================================

    /// Open the telemetry stream.
    ///
    /// Events and faults arrive on separate channels; a clean server-side
    /// close is reported as [`StreamError::Closed`]. Reconnecting is up to
    /// the caller, see [`Self::reconnecting_stream`].
    #[instrument(skip(self), fields(vehicle = self.vehicle.vehicle_id))]
    pub async fn stream(&self) -> StreamResult<EventStream> {
        let email = self
            .client
            .email()
            .ok_or_else(|| StreamError::Auth("no account email configured".into()))?;
        let token = self
            .vehicle
            .tokens
            .first()
            .ok_or_else(|| StreamError::Auth("vehicle record has no stream token".into()))?;
        let url = self
            .client
            .stream_url(self.vehicle.vehicle_id)
            .map_err(|e| StreamError::InvalidUrl(e.to_string()))?;

        EventStream::connect(
            self.client.stream_http_client(),
            url,
            email,
            token,
            self.client.channel_capacity(),
        )
        .await
    }

    /// Stream telemetry, re-opening the connection after each clean close
    /// according to `policy`
    pub fn reconnecting_stream(&self, policy: ReconnectPolicy) -> ReconnectingStream {
        crate::streaming::reconnecting(self.clone(), policy)
    }
}
