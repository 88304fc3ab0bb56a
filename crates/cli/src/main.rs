//! WellNest CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP gateway
//! - `query`    — Run one retrieval and print the JSON response
//! - `status`   — Show effective configuration
//! - `doctor`   — Check configuration and store connectivity
//! - `onboard`  — Write a default config file

use clap::{Parser, Subcommand};
use wellnest_config::{AppConfig, LoggingConfig};

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "wellnest",
    about = "WellNest — therapy activity retrieval service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch matching activities and print them as JSON
    Query {
        /// Exact target age
        #[arg(long)]
        age: Option<String>,

        /// Case-insensitive diagnosis substring
        #[arg(long)]
        diagnosis: Option<String>,

        /// Comma-separated themes (matches any)
        #[arg(long)]
        themes: Option<String>,
    },

    /// Show effective configuration
    Status,

    /// Diagnose configuration and store connectivity
    Doctor,

    /// Write a default configuration file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; commands
    // report config errors themselves.
    let logging_config = AppConfig::load()
        .map(|c| c.logging)
        .unwrap_or_else(|_| LoggingConfig::default());
    logging::init(cli.verbose, &logging_config);

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Query {
            age,
            diagnosis,
            themes,
        } => commands::query::run(age, diagnosis, themes).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
