//! Control commands - one command request per invocation

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use tesla_client::VehicleHandle;

use crate::output::OutputContext;

/// Commands that take no arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simple {
    Lock,
    Unlock,
    Honk,
    Flash,
    ValetReset,
    Homelink,
    SentryOn,
    SentryOff,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ChargeAction {
    /// Start charging
    Start,
    /// Stop charging
    Stop,
    /// Set the charge limit to the standard setting
    Standard,
    /// Set the charge limit to maximum range
    Max,
    /// Set the charge limit to a percentage
    Limit { percent: i32 },
    /// Open the charge port door
    OpenPort,
    /// Close the charge port door
    ClosePort,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ClimateAction {
    /// Start climate control
    Start,
    /// Stop climate control
    Stop,
    /// Set driver and passenger temperatures (°C)
    Temps { driver: f64, passenger: f64 },
}

#[derive(Debug, Clone, Subcommand)]
pub enum UpdateAction {
    /// Install a downloaded update after a delay
    Schedule { offset_sec: i64 },
    /// Cancel a scheduled update
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Forward,
    Reverse,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

fn report(ctx: &OutputContext, label: &str, result: tesla_client::Result<()>) -> Result<()> {
    result.with_context(|| format!("{} failed", label))?;
    ctx.success(&format!("{}: ok", label));
    Ok(())
}

pub async fn simple(vehicle: &VehicleHandle, command: Simple, ctx: &OutputContext) -> Result<()> {
    let (label, result) = match command {
        Simple::Lock => ("lock", vehicle.lock_doors().await),
        Simple::Unlock => ("unlock", vehicle.unlock_doors().await),
        Simple::Honk => ("honk", vehicle.honk_horn().await),
        Simple::Flash => ("flash", vehicle.flash_lights().await),
        Simple::ValetReset => ("valet-reset", vehicle.reset_valet_pin().await),
        Simple::Homelink => ("homelink", vehicle.trigger_homelink().await),
        Simple::SentryOn => ("sentry on", vehicle.sentry_mode_enable().await),
        Simple::SentryOff => ("sentry off", vehicle.sentry_mode_disable().await),
    };
    report(ctx, label, result)
}

pub async fn charge(
    vehicle: &VehicleHandle,
    action: &ChargeAction,
    ctx: &OutputContext,
) -> Result<()> {
    let (label, result) = match action {
        ChargeAction::Start => ("charge start", vehicle.start_charging().await),
        ChargeAction::Stop => ("charge stop", vehicle.stop_charging().await),
        ChargeAction::Standard => ("charge standard", vehicle.set_charge_limit_standard().await),
        ChargeAction::Max => ("charge max", vehicle.set_charge_limit_max().await),
        ChargeAction::Limit { percent } => {
            ("charge limit", vehicle.set_charge_limit(*percent).await)
        }
        ChargeAction::OpenPort => ("charge open-port", vehicle.open_charge_port().await),
        ChargeAction::ClosePort => ("charge close-port", vehicle.close_charge_port().await),
    };
    report(ctx, label, result)
}

pub async fn climate(
    vehicle: &VehicleHandle,
    action: &ClimateAction,
    ctx: &OutputContext,
) -> Result<()> {
    let (label, result) = match action {
        ClimateAction::Start => ("climate start", vehicle.start_air_conditioning().await),
        ClimateAction::Stop => ("climate stop", vehicle.stop_air_conditioning().await),
        ClimateAction::Temps { driver, passenger } => (
            "climate temps",
            vehicle.set_temperature(*driver, *passenger).await,
        ),
    };
    report(ctx, label, result)
}

pub async fn update(
    vehicle: &VehicleHandle,
    action: &UpdateAction,
    ctx: &OutputContext,
) -> Result<()> {
    let (label, result) = match action {
        UpdateAction::Schedule { offset_sec } => (
            "update schedule",
            vehicle.schedule_software_update(*offset_sec).await,
        ),
        UpdateAction::Cancel => ("update cancel", vehicle.cancel_software_update().await),
    };
    report(ctx, label, result)
}

pub async fn roof(
    vehicle: &VehicleHandle,
    state: &str,
    percent: i32,
    ctx: &OutputContext,
) -> Result<()> {
    report(ctx, "roof", vehicle.move_pano_roof(state, percent).await)
}

pub async fn trunk(vehicle: &VehicleHandle, which: &str, ctx: &OutputContext) -> Result<()> {
    report(ctx, "trunk", vehicle.open_trunk(which).await)
}

pub async fn autopark(
    vehicle: &VehicleHandle,
    direction: Direction,
    ctx: &OutputContext,
) -> Result<()> {
    let result = match direction {
        Direction::Forward => vehicle.autopark_forward().await,
        Direction::Reverse => vehicle.autopark_reverse().await,
        Direction::Abort => vehicle.autopark_abort().await,
    };
    report(ctx, "autopark", result)
}

pub async fn start(vehicle: &VehicleHandle, password: &str, ctx: &OutputContext) -> Result<()> {
    report(ctx, "start", vehicle.start(password).await)
}
