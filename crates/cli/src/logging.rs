//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins; otherwise `--verbose` means `debug`, else the
//! configured level. `logging.format = "json"` emits one JSON object per
//! event for log shipping.

use tracing_subscriber::EnvFilter;
use wellnest_config::LoggingConfig;

pub fn init(verbose: bool, config: &LoggingConfig) {
    let default_level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
