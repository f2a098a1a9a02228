//! `campusbot serve`: start the HTTP server.

use campusbot_config::AppConfig;
use std::path::Path;
use tracing::debug;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    debug!(?config, "Effective configuration");

    println!("campusbot");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);
    println!("   Data dir:  {}", config.knowledge.data_dir.display());

    campusbot_gateway::start(config).await?;

    Ok(())
}
