//! Garmin Connect MCP server entry point.
//!
//! Loads configuration, sets up logging on stderr and serves the configured
//! transport. Garmin login is deferred to the first tool call.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use garmin_mcp_server::core::{Config, LazyClient, McpServer, TransportService};
use garmin_mcp_server::domains::tools::Gateway;
use garmin_mcp_server::garmin::session;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_logging(&config.logging.level, config.logging.with_timestamps);

    info!("Starting {} v{}", config.server.name, config.server.version);
    for warning in config.startup_warnings() {
        warn!("{}", warning);
    }
    if let Some(root) = &config.garmin.upload_root {
        info!("Activity upload enabled from {}", root.display());
    }

    let login = config.clone();
    let client = LazyClient::new(move || session::connect(&login));
    let gateway = Gateway::new(Arc::new(client));

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config, gateway);

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Logs always go to stderr: stdout carries the STDIO protocol stream.
fn init_logging(level: &str, with_timestamps: bool) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
