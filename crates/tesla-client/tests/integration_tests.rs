//! Integration tests for tesla-client
//!
//! These tests run the client against a local mock of the owner API and the
//! streaming host, and check what actually goes over the wire.

use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use tesla_client::testing::{
    command_path, test_vehicle, vehicle_path, wait_for, MockVehicleApi, TestServer, TEST_TOKEN,
};
use tesla_client::{
    AutoParkAction, Location, ReconnectPolicy, StreamError, TeslaClientError, VehicleHandle,
};

const PARKED: &str = "1418322000000,,6342.7,84,30,147,37.492,-121.944,0,,218,196,147";
const DRIVING: &str = "1418322001000,65,6343.1,83,31,150,37.493,-121.945,42,D,217,195,150";

/// Basic auth for `driver@example.com:stream-token-1`
const STREAM_AUTH: &str = "Basic ZHJpdmVyQGV4YW1wbGUuY29tOnN0cmVhbS10b2tlbi0x";

async fn create_test_server() -> (MockVehicleApi, TestServer, VehicleHandle) {
    let api = MockVehicleApi::new();
    let server = api.serve().await.expect("Failed to start test server");
    let vehicle = server.client.vehicle(test_vehicle());
    (api, server, vehicle)
}

fn quick_reconnect(max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy::default()
        .with_max_attempts(max_attempts)
        .with_backoff(Duration::from_millis(1), Duration::from_millis(5))
}

// =============================================================================
// Vehicle List
// =============================================================================

#[tokio::test]
async fn test_list_vehicles() {
    let (api, server, _) = create_test_server().await;
    api.set_vehicles(&[test_vehicle()]);

    let vehicles = server.client.list_vehicles().await.unwrap();
    assert_eq!(vehicles, vec![test_vehicle()]);

    let requests = api.requests_to("/api/1/vehicles");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some(format!("Bearer {}", TEST_TOKEN).as_str())
    );
}

#[tokio::test]
async fn test_list_vehicles_unauthorized() {
    let (api, server, _) = create_test_server().await;
    api.respond("/api/1/vehicles", 401, r#"{"error":"invalid bearer token"}"#);

    match server.client.list_vehicles().await.unwrap_err() {
        TeslaClientError::ServerError { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid bearer token");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

// =============================================================================
// Commands: wire format
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Call {
    OpenChargePort,
    CloseChargePort,
    ChargeStandard,
    ChargeMaxRange,
    SetChargeLimit(i32),
    StartCharging,
    StopCharging,
    ScheduleUpdate(i64),
    CancelUpdate,
    Lock,
    Unlock,
    ResetValetPin,
    SentryOn,
    SentryOff,
    FlashLights,
    HonkHorn,
    StartAc,
    StopAc,
    PanoRoof(&'static str, i32),
    OpenTrunk(&'static str),
    AutoparkAt(AutoParkAction),
    HomelinkAt,
}

async fn invoke(vehicle: &VehicleHandle, call: Call) -> tesla_client::Result<()> {
    let spot = Location::new(35.1, 20.2);
    match call {
        Call::OpenChargePort => vehicle.open_charge_port().await,
        Call::CloseChargePort => vehicle.close_charge_port().await,
        Call::ChargeStandard => vehicle.set_charge_limit_standard().await,
        Call::ChargeMaxRange => vehicle.set_charge_limit_max().await,
        Call::SetChargeLimit(percent) => vehicle.set_charge_limit(percent).await,
        Call::StartCharging => vehicle.start_charging().await,
        Call::StopCharging => vehicle.stop_charging().await,
        Call::ScheduleUpdate(offset) => vehicle.schedule_software_update(offset).await,
        Call::CancelUpdate => vehicle.cancel_software_update().await,
        Call::Lock => vehicle.lock_doors().await,
        Call::Unlock => vehicle.unlock_doors().await,
        Call::ResetValetPin => vehicle.reset_valet_pin().await,
        Call::SentryOn => vehicle.sentry_mode_enable().await,
        Call::SentryOff => vehicle.sentry_mode_disable().await,
        Call::FlashLights => vehicle.flash_lights().await,
        Call::HonkHorn => vehicle.honk_horn().await,
        Call::StartAc => vehicle.start_air_conditioning().await,
        Call::StopAc => vehicle.stop_air_conditioning().await,
        Call::PanoRoof(state, percent) => vehicle.move_pano_roof(state, percent).await,
        Call::OpenTrunk(which) => vehicle.open_trunk(which).await,
        Call::AutoparkAt(action) => vehicle.autopark_at(action, spot).await,
        Call::HomelinkAt => vehicle.trigger_homelink_at(spot).await,
    }
}

#[rstest]
#[case::open_charge_port(Call::OpenChargePort, "charge_port_door_open", None)]
#[case::close_charge_port(Call::CloseChargePort, "charge_port_door_close", None)]
#[case::charge_standard(Call::ChargeStandard, "charge_standard", None)]
#[case::charge_max_range(Call::ChargeMaxRange, "charge_max_range", None)]
#[case::set_charge_limit(Call::SetChargeLimit(80), "set_charge_limit", Some(json!({"percent": 80})))]
#[case::start_charging(Call::StartCharging, "charge_start", None)]
#[case::stop_charging(Call::StopCharging, "charge_stop", None)]
#[case::schedule_update(
    Call::ScheduleUpdate(7200),
    "schedule_software_update",
    Some(json!({"offset_sec": 7200}))
)]
#[case::cancel_update(Call::CancelUpdate, "cancel_software_update", None)]
#[case::lock(Call::Lock, "door_lock", None)]
#[case::unlock(Call::Unlock, "door_unlock", None)]
#[case::reset_valet_pin(Call::ResetValetPin, "reset_valet_pin", None)]
#[case::sentry_on(Call::SentryOn, "set_sentry_mode", Some(json!({"on": true})))]
#[case::sentry_off(Call::SentryOff, "set_sentry_mode", Some(json!({"on": false})))]
#[case::flash_lights(Call::FlashLights, "flash_lights", None)]
#[case::honk_horn(Call::HonkHorn, "honk_horn", None)]
#[case::start_ac(Call::StartAc, "auto_conditioning_start", None)]
#[case::stop_ac(Call::StopAc, "auto_conditioning_stop", None)]
#[case::pano_roof(
    Call::PanoRoof("move", 42),
    "sun_roof_control",
    Some(json!({"state": "move", "percent": 42}))
)]
#[case::open_trunk(Call::OpenTrunk("rear"), "trunk_open", Some(json!({"which_trunk": "rear"})))]
#[case::autopark(
    Call::AutoparkAt(AutoParkAction::StartReverse),
    "autopark_request",
    Some(json!({"vehicle_id": 123, "lat": 35.1, "lon": 20.2, "action": "start_reverse"}))
)]
#[case::homelink(Call::HomelinkAt, "trigger_homelink", Some(json!({"lat": 35.1, "lon": 20.2})))]
#[tokio::test]
async fn test_command_wire_format(
    #[case] call: Call,
    #[case] command: &str,
    #[case] body: Option<Value>,
) {
    let (api, _server, vehicle) = create_test_server().await;

    invoke(&vehicle, call).await.unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 1, "exactly one request per command");
    let request = &requests[0];
    assert_eq!(request.method, axum::http::Method::POST);
    assert_eq!(request.path, command_path(321, command));
    assert_eq!(request.query, None);
    assert_eq!(request.json(), body);
}

#[tokio::test]
async fn test_set_temperature_query() {
    let (api, _server, vehicle) = create_test_server().await;

    vehicle.set_temperature(21.5, 22.0).await.unwrap();

    let requests = api.requests_to(&command_path(321, "set_temps"));
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].query_pairs(),
        vec![
            ("driver_temp".to_string(), "21.5".to_string()),
            ("passenger_temp".to_string(), "22".to_string()),
        ]
    );
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn test_start_sends_encoded_password() {
    let (api, _server, vehicle) = create_test_server().await;

    vehicle.start("p@ss w&rd").await.unwrap();

    let requests = api.requests_to(&command_path(321, "remote_start_drive"));
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].query_pairs(),
        vec![("password".to_string(), "p@ss w&rd".to_string())]
    );
}

#[tokio::test]
async fn test_repeated_command_sends_each_time() {
    let (api, _server, vehicle) = create_test_server().await;

    vehicle.lock_doors().await.unwrap();
    vehicle.lock_doors().await.unwrap();

    assert_eq!(api.requests_to(&command_path(321, "door_lock")).len(), 2);
}

// =============================================================================
// Commands: response envelope
// =============================================================================

#[tokio::test]
async fn test_command_rejection_reason() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond(
        command_path(321, "honk_horn"),
        200,
        r#"{"response":{"result":false,"reason":"could_not_wake_buses"}}"#,
    );

    let err = vehicle.honk_horn().await.unwrap_err();
    assert!(matches!(err, TeslaClientError::CommandFailed(_)));
    assert_eq!(err.to_string(), "could_not_wake_buses");
    assert_eq!(err.reason(), Some("could_not_wake_buses"));
}

#[rstest]
#[case::empty_body("")]
#[case::result_true(r#"{"response":{"result":true,"reason":""}}"#)]
#[case::false_without_reason(r#"{"response":{"result":false,"reason":""}}"#)]
#[case::missing_fields(r#"{"response":{}}"#)]
#[tokio::test]
async fn test_command_success_bodies(#[case] body: &str) {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond(command_path(321, "flash_lights"), 200, body);

    assert!(vehicle.flash_lights().await.is_ok());
}

#[tokio::test]
async fn test_command_malformed_body() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond(command_path(321, "door_unlock"), 200, "<html>oops</html>");

    let err = vehicle.unlock_doors().await.unwrap_err();
    assert!(matches!(err, TeslaClientError::ParseError(_)));
}

#[tokio::test]
async fn test_command_http_error() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond(
        command_path(321, "charge_start"),
        503,
        r#"{"error":"vehicle unavailable"}"#,
    );

    match vehicle.start_charging().await.unwrap_err() {
        TeslaClientError::ServerError { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "vehicle unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_command_http_error_without_body() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond(command_path(321, "charge_stop"), 500, "");

    match vehicle.stop_charging().await.unwrap_err() {
        TeslaClientError::ServerError { status, message } => {
            assert_eq!(status, 500);
            assert!(message.starts_with("HTTP 500"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_request_timeout_status() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond(command_path(321, "door_lock"), 408, "");

    assert!(matches!(
        vehicle.lock_doors().await.unwrap_err(),
        TeslaClientError::Timeout
    ));
}

// =============================================================================
// Wake-up and State Reads
// =============================================================================

#[tokio::test]
async fn test_wake_up_returns_vehicle() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond_json(
        vehicle_path(321, "wake_up"),
        json!({"response": {"id": 321, "vehicle_id": 123, "vin": "5YJSA1CN5DFP00101", "state": "online"}}),
    );

    let woken = vehicle.wake_up().await.unwrap();
    assert_eq!(woken.id, 321);
    assert!(woken.is_online());
    assert_eq!(api.requests_to(&vehicle_path(321, "wake_up")).len(), 1);
}

#[tokio::test]
async fn test_wake_up_empty_body() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond(vehicle_path(321, "wake_up"), 200, "");

    assert!(matches!(
        vehicle.wake_up().await.unwrap_err(),
        TeslaClientError::ParseError(_)
    ));
}

#[tokio::test]
async fn test_state_reads() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond_json(vehicle_path(321, "mobile_enabled"), json!({"response": true}));
    api.respond_json(
        vehicle_path(321, "data_request/charge_state"),
        json!({"response": {"charging_state": "Charging", "battery_level": 64, "charge_limit_soc": 90}}),
    );
    api.respond_json(
        vehicle_path(321, "data_request/climate_state"),
        json!({"response": {"inside_temp": 19.5, "is_auto_conditioning_on": false}}),
    );
    api.respond_json(
        vehicle_path(321, "data_request/gui_settings"),
        json!({"response": {"gui_distance_units": "km/hr", "gui_24_hour_time": true}}),
    );
    api.respond_json(
        vehicle_path(321, "data_request/vehicle_state"),
        json!({"response": {"locked": true, "car_version": "2019.8.5", "df": 0}}),
    );

    assert!(vehicle.mobile_enabled().await.unwrap());

    let charge = vehicle.charge_state().await.unwrap();
    assert_eq!(charge.charging_state.as_deref(), Some("Charging"));
    assert_eq!(charge.battery_level, Some(64));

    let climate = vehicle.climate_state().await.unwrap();
    assert_eq!(climate.inside_temp, Some(19.5));

    let gui = vehicle.gui_settings().await.unwrap();
    assert_eq!(gui.gui_24_hour_time, Some(true));

    let state = vehicle.vehicle_state().await.unwrap();
    assert_eq!(state.locked, Some(true));
    assert_eq!(state.df, Some(0));

    assert!(api
        .requests()
        .iter()
        .all(|r| r.method == axum::http::Method::GET));
}

#[tokio::test]
async fn test_state_read_not_found() {
    let (_api, _server, vehicle) = create_test_server().await;

    assert!(matches!(
        vehicle.drive_state().await.unwrap_err(),
        TeslaClientError::ServerError { status: 404, .. }
    ));
}

// =============================================================================
// Autopark / Homelink
// =============================================================================

#[tokio::test]
async fn test_autopark_uses_reported_location() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond_json(
        vehicle_path(321, "data_request/drive_state"),
        json!({"response": {"latitude": 37.492, "longitude": -121.944, "heading": 90}}),
    );

    vehicle.autopark_forward().await.unwrap();

    let requests = api.requests_to(&command_path(321, "autopark_request"));
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].json(),
        Some(json!({"vehicle_id": 123, "lat": 37.492, "lon": -121.944, "action": "start_forward"}))
    );
}

#[tokio::test]
async fn test_autopark_read_failure_sends_nothing() {
    let (api, _server, vehicle) = create_test_server().await;

    assert!(vehicle.autopark_abort().await.is_err());
    assert!(api
        .requests_to(&command_path(321, "autopark_request"))
        .is_empty());
}

#[tokio::test]
async fn test_null_coordinates_read_but_send_nothing() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond_json(
        vehicle_path(321, "data_request/drive_state"),
        json!({"response": {"latitude": null, "longitude": null, "heading": 90}}),
    );

    let state = vehicle.drive_state().await.unwrap();
    assert_eq!(state.latitude, None);
    assert_eq!(state.location(), None);
    assert_eq!(state.heading, Some(90));

    let err = vehicle.autopark_abort().await.unwrap_err();
    assert!(matches!(err, TeslaClientError::NoLocation), "got {:?}", err);
    assert!(vehicle.trigger_homelink().await.is_err());

    assert!(api
        .requests_to(&command_path(321, "autopark_request"))
        .is_empty());
    assert!(api
        .requests_to(&command_path(321, "trigger_homelink"))
        .is_empty());
}

#[tokio::test]
async fn test_homelink_uses_reported_location() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond_json(
        vehicle_path(321, "data_request/drive_state"),
        json!({"response": {"latitude": 1.5, "longitude": -2.5}}),
    );

    vehicle.trigger_homelink().await.unwrap();

    let requests = api.requests_to(&command_path(321, "trigger_homelink"));
    assert_eq!(requests[0].json(), Some(json!({"lat": 1.5, "lon": -2.5})));
}

// =============================================================================
// Telemetry Stream
// =============================================================================

#[tokio::test]
async fn test_stream_events_then_closed() {
    let (api, _server, vehicle) = create_test_server().await;
    api.set_stream(&[PARKED, DRIVING]);

    let mut stream = vehicle.stream().await.unwrap();

    let first = stream.recv().await.unwrap().unwrap();
    assert_eq!(first.speed, None);
    assert_eq!(first.soc, Some(84));
    let second = stream.recv().await.unwrap().unwrap();
    assert_eq!(second.speed, Some(65));
    assert_eq!(second.shift_state.as_deref(), Some("D"));

    let err = stream.recv().await.unwrap().unwrap_err();
    assert!(err.is_closed());
    assert_eq!(err.to_string(), "HTTP stream closed");

    assert!(wait_for(|| {
        let done = stream.is_finished();
        async move { done }
    }, Duration::from_secs(1))
    .await);
}

#[tokio::test]
async fn test_stream_request() {
    let (api, _server, vehicle) = create_test_server().await;

    let mut stream = vehicle.stream().await.unwrap();
    assert!(stream.recv().await.unwrap().unwrap_err().is_closed());

    let requests = api.stream_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, axum::http::Method::GET);
    assert_eq!(requests[0].path, "/stream/123/");
    assert_eq!(requests[0].authorization.as_deref(), Some(STREAM_AUTH));
    assert_eq!(
        requests[0].query.as_deref(),
        Some("values=speed,odometer,soc,elevation,est_heading,est_lat,est_lng,power,shift_state,range,est_range,heading")
    );
}

#[tokio::test]
async fn test_stream_without_token() {
    let (_api, server, _) = create_test_server().await;
    let mut record = test_vehicle();
    record.tokens.clear();

    let err = server.client.vehicle(record).stream().await.unwrap_err();
    assert!(matches!(err, StreamError::Auth(_)));
}

#[tokio::test]
async fn test_stream_rejected_by_server() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond("/stream/123/", 401, "unauthorized");

    match vehicle.stream().await.unwrap_err() {
        StreamError::Server { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "unauthorized");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_malformed_record() {
    let (api, _server, vehicle) = create_test_server().await;
    api.set_stream(&[PARKED, "not,a,record", DRIVING]);

    let mut stream = vehicle.stream().await.unwrap();
    assert!(stream.recv().await.unwrap().is_ok());
    assert!(matches!(
        stream.recv().await.unwrap().unwrap_err(),
        StreamError::Parse(_)
    ));
    assert!(stream.recv().await.is_none());
}

#[tokio::test]
async fn test_reconnecting_stream_gives_up() {
    let (api, _server, vehicle) = create_test_server().await;

    let items: Vec<_> = vehicle
        .reconnecting_stream(quick_reconnect(2))
        .collect()
        .await;

    assert_eq!(items.len(), 1);
    assert!(items[0].as_ref().unwrap_err().is_closed());
    // initial connection plus two reconnects
    assert_eq!(api.stream_requests().len(), 3);
}

#[tokio::test]
async fn test_reconnecting_stream_resumes_events() {
    let (api, _server, vehicle) = create_test_server().await;
    api.set_stream(&[PARKED]);

    let events: Vec<_> = vehicle
        .reconnecting_stream(quick_reconnect(1))
        .take(3)
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.is_ok()));
    assert!(api.stream_requests().len() >= 3);
}

#[tokio::test]
async fn test_reconnecting_stream_passes_through_failures() {
    let (api, _server, vehicle) = create_test_server().await;
    api.respond("/stream/123/", 500, "");

    let items: Vec<_> = vehicle
        .reconnecting_stream(quick_reconnect(5))
        .collect()
        .await;

    assert_eq!(items.len(), 1);
    assert!(matches!(
        items[0].as_ref().unwrap_err(),
        StreamError::Server { status: 500, .. }
    ));
    assert_eq!(api.stream_requests().len(), 1);
}

#[tokio::test]
async fn test_reconnecting_stream_retries_failed_reopen() {
    let (api, _server, vehicle) = create_test_server().await;
    api.set_stream(&[PARKED]);

    let mut stream = vehicle.reconnecting_stream(quick_reconnect(2));
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.shift_state, None);

    // Every re-open after the close is refused
    api.respond("/stream/123/", 503, "down");
    let rest: Vec<_> = stream.collect().await;

    assert_eq!(rest.len(), 1);
    assert!(matches!(
        rest[0].as_ref().unwrap_err(),
        StreamError::Server { status: 503, .. }
    ));
    assert_eq!(api.stream_requests().len(), 3);
}

#[tokio::test]
async fn test_never_reconnect() {
    let (api, _server, vehicle) = create_test_server().await;
    api.set_stream(&[DRIVING]);

    let items: Vec<_> = vehicle
        .reconnecting_stream(ReconnectPolicy::never())
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].as_ref().unwrap_err().is_closed());
    assert_eq!(api.stream_requests().len(), 1);
}
