//! `wellnest query` — Run one retrieval from the command line.

use wellnest_config::AppConfig;
use wellnest_core::FilterCriteria;

pub async fn run(
    age: Option<String>,
    diagnosis: Option<String>,
    themes: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let criteria =
        FilterCriteria::parse(age.as_deref(), diagnosis.as_deref(), themes.as_deref())?;
    let service = wellnest_gateway::stores::build_service(&config).await?;
    let response = service.fetch_activities(criteria).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
