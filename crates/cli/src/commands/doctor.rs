//! `wellnest doctor` — Diagnose configuration and store connectivity.

use std::time::Duration;
use wellnest_config::AppConfig;
use wellnest_gateway::stores;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 WellNest Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — defaults and environment only (`wellnest onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before checking stores.");
            return Ok(());
        }
    };

    // Structured store
    match stores::build_catalog(&config.database).await {
        Ok(catalog) => match catalog.ping().await {
            Ok(()) => println!("  ✅ Catalog reachable ({})", catalog.name()),
            Err(e) => {
                println!("  ❌ Catalog ping failed ({}): {e}", catalog.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Catalog unavailable: {e}");
            issues += 1;
        }
    }

    // Content store
    match stores::build_content(&config.content) {
        Ok(content) if content.name() == "none" => {
            println!("  ⚠️  No content store — activities will have empty instructions");
            issues += 1;
        }
        Ok(content) => {
            let timeout = Duration::from_secs(config.content.request_timeout_secs);
            let prefix = format!("{}/", config.content.prefix_root.trim_end_matches('/'));
            match tokio::time::timeout(timeout, content.list(&prefix, None)).await {
                Ok(Ok(page)) => println!(
                    "  ✅ Content store reachable ({}, {} keys on first page)",
                    content.name(),
                    page.keys.len()
                ),
                Ok(Err(e)) => {
                    println!("  ❌ Content store listing failed ({}): {e}", content.name());
                    issues += 1;
                }
                Err(_) => {
                    println!(
                        "  ❌ Content store timed out after {}s ({})",
                        timeout.as_secs(),
                        content.name()
                    );
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Content store misconfigured: {e}");
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
