//! Tesla CLI - Command-line tool for Tesla vehicle remote control
//!
//! Sends commands, reads vehicle state and follows the live telemetry stream.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tesla_client::{ClientConfig, TeslaClient, VehicleHandle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::control::{ChargeAction, ClimateAction, Direction, Toggle, UpdateAction};
use crate::commands::state::StateKind;
use crate::commands::Simple;
use crate::config::{Config, MergedConfig, Overrides};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "tesla-cli")]
#[command(author, version, about = "Tesla vehicle remote control CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Owner API base URL
    #[arg(long, env = "TESLA_API_URL")]
    api_url: Option<String>,

    /// Telemetry streaming URL
    #[arg(long, env = "TESLA_STREAMING_URL")]
    streaming_url: Option<String>,

    /// OAuth access token
    #[arg(long, env = "TESLA_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Account email (used to authenticate the telemetry stream)
    #[arg(long, env = "TESLA_EMAIL")]
    email: Option<String>,

    /// Vehicle to act on: API id, VIN or display name
    #[arg(long, env = "TESLA_VEHICLE")]
    vehicle: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "TESLA_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the vehicles on the account
    Vehicles,

    #[command(flatten)]
    Vehicle(VehicleCommand),
}

/// Commands that act on one selected vehicle
#[derive(Subcommand)]
enum VehicleCommand {
    /// Read vehicle state
    State {
        #[arg(value_enum)]
        kind: StateKind,
    },

    /// Wake the vehicle
    Wake,

    /// Lock the doors
    Lock,

    /// Unlock the doors
    Unlock,

    /// Honk the horn
    Honk,

    /// Flash the lights
    Flash,

    /// Charging controls
    Charge {
        #[command(subcommand)]
        action: ChargeAction,
    },

    /// Climate controls
    Climate {
        #[command(subcommand)]
        action: ClimateAction,
    },

    /// Move the panoramic roof
    Roof {
        /// open, close, comfort, vent or move
        state: String,

        /// Position for `move`
        #[arg(default_value_t = 0)]
        percent: i32,
    },

    /// Open a trunk
    Trunk {
        /// front or rear
        which: String,
    },

    /// Enable or disable sentry mode
    Sentry {
        #[arg(value_enum)]
        mode: Toggle,
    },

    /// Software update scheduling
    Update {
        #[command(subcommand)]
        action: UpdateAction,
    },

    /// Clear the valet mode PIN
    ValetReset,

    /// Toggle Homelink at the vehicle's position
    Homelink,

    /// Summon the vehicle forward or backward from where it is
    Autopark {
        #[arg(value_enum)]
        direction: Direction,
    },

    /// Enable keyless driving
    Start {
        /// Account password
        #[arg(long, env = "TESLA_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Follow live telemetry
    Stream {
        /// Give up after this many consecutive reconnects
        #[arg(long)]
        max_attempts: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    let merged = config.merge_with_args(&Overrides {
        api_url: cli.api_url.as_deref(),
        streaming_url: cli.streaming_url.as_deref(),
        access_token: cli.token.as_deref(),
        email: cli.email.as_deref(),
        vehicle: cli.vehicle.as_deref(),
        output: cli.output.map(|f| f.as_str()),
        no_color: cli.no_color,
    });

    let format = <OutputFormat as clap::ValueEnum>::from_str(&merged.output, true)
        .map_err(|e| anyhow::anyhow!("Invalid output format '{}': {}", merged.output, e))?;
    let ctx = OutputContext::new(format, merged.no_color, cli.quiet);

    let client = create_client(&merged)?;

    match &cli.command {
        Commands::Vehicles => commands::vehicles(&client, &ctx).await?,
        Commands::Vehicle(command) => {
            let vehicle = commands::resolve_vehicle(&client, merged.vehicle.as_deref()).await?;
            run(&vehicle, command, &ctx).await?
        }
    }

    Ok(())
}

/// Execute a command against the selected vehicle
async fn run(vehicle: &VehicleHandle, command: &VehicleCommand, ctx: &OutputContext) -> Result<()> {
    match command {
        VehicleCommand::State { kind } => commands::state(vehicle, *kind, ctx).await,
        VehicleCommand::Wake => commands::wake(vehicle, ctx).await,
        VehicleCommand::Lock => commands::simple(vehicle, Simple::Lock, ctx).await,
        VehicleCommand::Unlock => commands::simple(vehicle, Simple::Unlock, ctx).await,
        VehicleCommand::Honk => commands::simple(vehicle, Simple::Honk, ctx).await,
        VehicleCommand::Flash => commands::simple(vehicle, Simple::Flash, ctx).await,
        VehicleCommand::ValetReset => commands::simple(vehicle, Simple::ValetReset, ctx).await,
        VehicleCommand::Homelink => commands::simple(vehicle, Simple::Homelink, ctx).await,
        VehicleCommand::Sentry { mode } => {
            let command = match mode {
                Toggle::On => Simple::SentryOn,
                Toggle::Off => Simple::SentryOff,
            };
            commands::simple(vehicle, command, ctx).await
        }
        VehicleCommand::Charge { action } => commands::charge(vehicle, action, ctx).await,
        VehicleCommand::Climate { action } => commands::climate(vehicle, action, ctx).await,
        VehicleCommand::Update { action } => commands::update(vehicle, action, ctx).await,
        VehicleCommand::Roof { state, percent } => {
            commands::roof(vehicle, state, *percent, ctx).await
        }
        VehicleCommand::Trunk { which } => commands::trunk(vehicle, which, ctx).await,
        VehicleCommand::Autopark { direction } => {
            commands::autopark(vehicle, *direction, ctx).await
        }
        VehicleCommand::Start { password } => commands::start(vehicle, password, ctx).await,
        VehicleCommand::Stream { max_attempts } => {
            commands::stream(vehicle, *max_attempts, ctx).await
        }
    }
}

/// Create a Tesla client from the merged configuration
fn create_client(merged: &MergedConfig) -> Result<TeslaClient> {
    let token = merged
        .access_token
        .as_deref()
        .context("No access token: pass --token or set TESLA_ACCESS_TOKEN")?;

    let mut builder = ClientConfig::builder(merged.api_url.as_str())
        .streaming_url(merged.streaming_url.as_str())
        .access_token(token);
    if let Some(email) = &merged.email {
        builder = builder.email(email.as_str());
    }

    TeslaClient::from_config(&builder.build()).context("Failed to create Tesla client")
}
