//! Sequential weather poller over raw TCP.

mod cli;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use weather_core::{
    ClientConfig, JsonLinesReporter, LogReporter, Orchestrator, Reporter, TcpConnector,
};

use cli::{Cli, Format};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => ClientConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let config = cli.apply(base);
    config.validate().context("invalid configuration")?;
    if config.api_key.is_empty() {
        tracing::warn!("no API key configured; the server will reject requests");
    }

    info!(
        host = %config.host,
        port = config.port,
        locations = config.locations.len(),
        "starting poller"
    );

    match cli.format {
        Format::Log => poll(config, LogReporter, cli.cycles),
        Format::Json => poll(config, JsonLinesReporter::new(std::io::stdout()), cli.cycles),
    }
    Ok(())
}

fn poll<R: Reporter>(config: ClientConfig, reporter: R, cycles: Option<u64>) {
    let connector = TcpConnector::new(config.transport.clone());
    Orchestrator::new(config, connector, reporter).run(cycles);
}
