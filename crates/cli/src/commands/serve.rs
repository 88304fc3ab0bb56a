//! `wellnest serve` — Start the HTTP API server.

use wellnest_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🌱 WellNest Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Catalog:   {}", config.database.backend);
    println!("   Content:   {}", config.content.backend);

    wellnest_gateway::start(config).await?;

    Ok(())
}
