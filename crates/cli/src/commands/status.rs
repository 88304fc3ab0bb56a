//! `wellnest status` — Show effective configuration.

use wellnest_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let content = &config.content;

    println!("🌱 WellNest Status");
    println!("==================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Catalog:      {}", config.database.backend);
    println!(
        "  Database URL: {}",
        if config.database.url.is_some() { "set" } else { "not set" }
    );
    println!("  Content:      {}", content.backend);
    match content.backend.as_str() {
        "s3" => {
            println!("  Bucket:       {}", content.bucket.as_deref().unwrap_or("(not set)"));
            println!("  Region:       {}", content.region);
            if let Some(endpoint) = &content.endpoint {
                println!("  Endpoint:     {endpoint}");
            }
            println!(
                "  Credentials:  {}",
                if content.has_s3_credentials() { "configured" } else { "missing" }
            );
        }
        "filesystem" => {
            println!("  Root dir:     {}", content.root_dir.as_deref().unwrap_or("(not set)"));
        }
        _ => {}
    }
    println!("  Prefix root:  {}", content.prefix_root);
    println!(
        "  Enrichment:   {} at once, {}s per call, {} listing pages max",
        content.enrich_concurrency, content.request_timeout_secs, content.max_list_pages
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!("  Logging:      {} ({})", config.logging.level, config.logging.format);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `wellnest onboard` first");
    }

    Ok(())
}
