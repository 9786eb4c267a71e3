//! Request and response types for the Tesla owner API

use serde::{Deserialize, Serialize};

// =============================================================================
// Response Wrappers
// =============================================================================

/// Every owner API read wraps its payload as `{"response": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub response: T,
}

/// Vehicle list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleList {
    pub response: Vec<Vehicle>,
    #[serde(default)]
    pub count: usize,
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

// =============================================================================
// Vehicle
// =============================================================================

/// A vehicle registered on the account
///
/// `id` addresses every command and state endpoint; `vehicle_id` is only used
/// by the telemetry stream and the autopark body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    #[serde(default)]
    pub vehicle_id: i64,
    #[serde(default)]
    pub vin: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub option_codes: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Stream credentials; the first token is the basic-auth password
    #[serde(default)]
    pub tokens: Vec<String>,
    /// "online", "asleep", "offline"
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub in_service: Option<bool>,
    #[serde(default)]
    pub id_s: Option<String>,
    #[serde(default)]
    pub calendar_enabled: Option<bool>,
    #[serde(default)]
    pub api_version: Option<u32>,
}

impl Vehicle {
    /// Whether the last known state is "online"
    pub fn is_online(&self) -> bool {
        self.state.as_deref() == Some("online")
    }
}

// =============================================================================
// Vehicle State Types
// =============================================================================

/// Charging status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChargeState {
    #[serde(default)]
    pub charging_state: Option<String>,
    #[serde(default)]
    pub charge_limit_soc: Option<i32>,
    #[serde(default)]
    pub charge_limit_soc_std: Option<i32>,
    #[serde(default)]
    pub charge_limit_soc_min: Option<i32>,
    #[serde(default)]
    pub charge_limit_soc_max: Option<i32>,
    #[serde(default)]
    pub battery_level: Option<i32>,
    #[serde(default)]
    pub usable_battery_level: Option<i32>,
    #[serde(default)]
    pub battery_range: Option<f64>,
    #[serde(default)]
    pub est_battery_range: Option<f64>,
    #[serde(default)]
    pub ideal_battery_range: Option<f64>,
    #[serde(default)]
    pub charge_energy_added: Option<f64>,
    #[serde(default)]
    pub charger_power: Option<i32>,
    #[serde(default)]
    pub charger_voltage: Option<i32>,
    #[serde(default)]
    pub charger_actual_current: Option<i32>,
    #[serde(default)]
    pub charge_rate: Option<f64>,
    #[serde(default)]
    pub charge_port_door_open: Option<bool>,
    #[serde(default)]
    pub time_to_full_charge: Option<f64>,
    #[serde(default)]
    pub scheduled_charging_pending: Option<bool>,
    #[serde(default)]
    pub scheduled_charging_start_time: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Cabin climate status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClimateState {
    #[serde(default)]
    pub inside_temp: Option<f64>,
    #[serde(default)]
    pub outside_temp: Option<f64>,
    #[serde(default)]
    pub driver_temp_setting: Option<f64>,
    #[serde(default)]
    pub passenger_temp_setting: Option<f64>,
    #[serde(default)]
    pub is_auto_conditioning_on: Option<bool>,
    #[serde(default)]
    pub is_front_defroster_on: Option<bool>,
    #[serde(default)]
    pub is_rear_defroster_on: Option<bool>,
    #[serde(default)]
    pub is_climate_on: Option<bool>,
    #[serde(default)]
    pub fan_status: Option<i32>,
    #[serde(default)]
    pub seat_heater_left: Option<i32>,
    #[serde(default)]
    pub seat_heater_right: Option<i32>,
    #[serde(default)]
    pub smart_preconditioning: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Position and motion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveState {
    #[serde(default)]
    pub shift_state: Option<String>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub heading: Option<i32>,
    #[serde(default)]
    pub gps_as_of: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl DriveState {
    /// The vehicle's reported coordinate, if it reported both halves
    pub fn location(&self) -> Option<Location> {
        Some(Location {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }
}

/// Display preferences configured in the car
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuiSettings {
    #[serde(default)]
    pub gui_distance_units: Option<String>,
    #[serde(default)]
    pub gui_temperature_units: Option<String>,
    #[serde(default)]
    pub gui_charge_rate_units: Option<String>,
    #[serde(default)]
    pub gui_24_hour_time: Option<bool>,
    #[serde(default)]
    pub gui_range_display: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Doors, trunks, software and security state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleState {
    #[serde(default)]
    pub api_version: Option<u32>,
    #[serde(default)]
    pub car_version: Option<String>,
    #[serde(default)]
    pub vehicle_name: Option<String>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub sentry_mode: Option<bool>,
    #[serde(default)]
    pub valet_mode: Option<bool>,
    #[serde(default)]
    pub valet_pin_needed: Option<bool>,
    #[serde(default)]
    pub remote_start: Option<bool>,
    #[serde(default)]
    pub homelink_nearby: Option<bool>,
    #[serde(default)]
    pub sun_roof_percent_open: Option<i32>,
    #[serde(default)]
    pub sun_roof_state: Option<String>,
    /// Driver front door
    #[serde(default)]
    pub df: Option<i32>,
    /// Driver rear door
    #[serde(default)]
    pub dr: Option<i32>,
    /// Passenger front door
    #[serde(default)]
    pub pf: Option<i32>,
    /// Passenger rear door
    #[serde(default)]
    pub pr: Option<i32>,
    /// Front trunk
    #[serde(default)]
    pub ft: Option<i32>,
    /// Rear trunk
    #[serde(default)]
    pub rt: Option<i32>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

// =============================================================================
// Command Request Types
// =============================================================================

/// A geographic coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Summon/autopark maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoParkAction {
    Abort,
    StartForward,
    StartReverse,
}

/// Body of `autopark_request` and `trigger_homelink`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoParkRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AutoParkAction>,
}

impl AutoParkRequest {
    /// Autopark body for a vehicle at a coordinate
    pub fn autopark(vehicle_id: i64, location: Location, action: AutoParkAction) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            lat: location.latitude,
            lon: location.longitude,
            action: Some(action),
        }
    }

    /// Homelink body: coordinate only
    pub fn homelink(location: Location) -> Self {
        Self {
            vehicle_id: None,
            lat: location.latitude,
            lon: location.longitude,
            action: None,
        }
    }
}

/// `set_charge_limit` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeLimitRequest {
    pub percent: i32,
}

/// `sun_roof_control` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunRoofRequest {
    pub state: String,
    pub percent: i32,
}

/// `trunk_open` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrunkRequest {
    pub which_trunk: String,
}

/// `set_sentry_mode` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentryModeRequest {
    pub on: bool,
}

/// `schedule_software_update` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftwareUpdateRequest {
    pub offset_sec: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vehicle_ignores_unknown_fields() {
        let vehicle: Vehicle = serde_json::from_value(json!({
            "id": 321,
            "vehicle_id": 123,
            "vin": "5YJSA11111111111",
            "display_name": "Nikola",
            "tokens": ["abc", "def"],
            "state": "online",
            "backseat_token": null
        }))
        .unwrap();

        assert_eq!(vehicle.id, 321);
        assert_eq!(vehicle.vehicle_id, 123);
        assert_eq!(vehicle.tokens.len(), 2);
        assert!(vehicle.is_online());
    }

    #[test]
    fn test_autopark_body() {
        let body = AutoParkRequest::autopark(
            123,
            Location::new(35.1, 20.2),
            AutoParkAction::StartForward,
        );
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"vehicle_id": 123, "lat": 35.1, "lon": 20.2, "action": "start_forward"})
        );
    }

    #[test]
    fn test_homelink_body_omits_id_and_action() {
        let body = AutoParkRequest::homelink(Location::new(1.5, -2.5));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"lat": 1.5, "lon": -2.5})
        );
    }

    #[test]
    fn test_drive_state_location() {
        let state: DriveState =
            serde_json::from_value(json!({"latitude": 35.1, "longitude": 20.2, "heading": 57}))
                .unwrap();
        assert_eq!(state.location(), Some(Location::new(35.1, 20.2)));
        assert_eq!(state.heading, Some(57));
        assert!(state.shift_state.is_none());
    }

    #[test]
    fn test_drive_state_null_coordinates() {
        let state: DriveState =
            serde_json::from_value(json!({"latitude": null, "longitude": null, "heading": 90}))
                .unwrap();
        assert_eq!(state.latitude, None);
        assert_eq!(state.location(), None);
        assert_eq!(state.heading, Some(90));

        let half: DriveState = serde_json::from_value(json!({"latitude": 35.1})).unwrap();
        assert_eq!(half.location(), None);
    }
}
