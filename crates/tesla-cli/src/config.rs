//! Configuration file handling for tesla-cli

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tesla_client::{DEFAULT_BASE_URL, DEFAULT_STREAMING_URL};

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Owner API base URL
    pub api_url: Option<String>,
    /// Telemetry streaming URL
    pub streaming_url: Option<String>,
    /// OAuth access token
    pub access_token: Option<String>,
    /// Account email (stream authentication)
    pub email: Option<String>,
    /// Default vehicle: API id, VIN or display name
    pub vehicle: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

/// Values given on the command line (or via environment)
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub api_url: Option<&'a str>,
    pub streaming_url: Option<&'a str>,
    pub access_token: Option<&'a str>,
    pub email: Option<&'a str>,
    pub vehicle: Option<&'a str>,
    pub output: Option<&'a str>,
    pub no_color: bool,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("tesla-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: &Overrides<'_>) -> MergedConfig {
        let pick = |arg: Option<&str>, file: &Option<String>| {
            arg.map(String::from).or_else(|| file.clone())
        };

        MergedConfig {
            api_url: pick(args.api_url, &self.api_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            streaming_url: pick(args.streaming_url, &self.streaming_url)
                .unwrap_or_else(|| DEFAULT_STREAMING_URL.to_string()),
            access_token: pick(args.access_token, &self.access_token),
            email: pick(args.email, &self.email),
            vehicle: pick(args.vehicle, &self.vehicle),
            output: pick(args.output, &self.output).unwrap_or_else(|| "table".to_string()),
            no_color: args.no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub api_url: String,
    pub streaming_url: String,
    pub access_token: Option<String>,
    pub email: Option<String>,
    pub vehicle: Option<String>,
    pub output: String,
    pub no_color: bool,
}
