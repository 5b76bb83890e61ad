//! Command-line flags for the poller.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use weather_core::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable log events.
    Log,
    /// One JSON object per line on stdout.
    Json,
}

/// Poll current weather for a list of locations, one request at a time.
#[derive(Debug, Parser)]
#[command(name = "weather-poller", version)]
pub struct Cli {
    /// Locations to query, in order. Defaults to the configured list.
    pub locations: Vec<String>,

    /// JSON config file; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// API key sent as the `key` query parameter.
    #[arg(long, env = "SENIVERSE_KEY", hide_env_values = true)]
    pub key: Option<String>,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub unit: Option<String>,

    /// Pause after each request, in milliseconds.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout_ms: Option<u64>,

    /// Read timeout in milliseconds; 0 disables it.
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Stop after this many passes over the locations.
    #[arg(long)]
    pub cycles: Option<u64>,

    #[arg(long, value_enum, default_value_t = Format::Log)]
    pub format: Format,
}

impl Cli {
    /// Apply flag overrides on top of `config`.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if !self.locations.is_empty() {
            config.locations = self.locations.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(key) = &self.key {
            config.api_key = key.clone();
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(unit) = &self.unit {
            config.unit = unit.clone();
        }
        if let Some(ms) = self.interval_ms {
            config.interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.transport.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.read_timeout_ms {
            config.transport.read_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        config
    }
}
