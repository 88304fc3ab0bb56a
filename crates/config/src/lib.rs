//! Configuration loading, validation, and management for WellNest.
//!
//! Loads configuration from `~/.wellnest/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.wellnest/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Structured store (activity catalog) configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Content store (flashcard objects) configuration
    #[serde(default)]
    pub content: ContentConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// "postgres", "sqlite" or "memory"
    #[serde(default = "default_database_backend")]
    pub backend: String,

    /// Connection string. Falls back to `DATABASE_URL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_backend() -> String {
    "postgres".into()
}
fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_database_backend(),
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Connection strings usually embed a password.
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &redact(&self.url))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// "s3", "filesystem" or "none"
    #[serde(default = "default_content_backend")]
    pub backend: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3-compatible endpoint (MinIO, R2, ...). Defaults to AWS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    /// Root directory for the filesystem backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    /// Key prefix under which per-activity folders live.
    #[serde(default = "default_prefix_root")]
    pub prefix_root: String,

    /// Maximum listing pages read per activity before reporting truncation.
    #[serde(default = "default_max_list_pages")]
    pub max_list_pages: usize,

    /// Timeout applied to each content store call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum activities enriched concurrently.
    #[serde(default = "default_enrich_concurrency")]
    pub enrich_concurrency: usize,
}

fn default_content_backend() -> String {
    "s3".into()
}
fn default_region() -> String {
    "us-east-1".into()
}
fn default_prefix_root() -> String {
    "master/selected_activities".into()
}
fn default_max_list_pages() -> usize {
    10
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_enrich_concurrency() -> usize {
    4
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            backend: default_content_backend(),
            bucket: None,
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            root_dir: None,
            prefix_root: default_prefix_root(),
            max_list_pages: default_max_list_pages(),
            request_timeout_secs: default_request_timeout_secs(),
            enrich_concurrency: default_enrich_concurrency(),
        }
    }
}

impl ContentConfig {
    /// True when every S3 setting needed to sign requests is present.
    pub fn has_s3_credentials(&self) -> bool {
        self.bucket.is_some() && self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

impl std::fmt::Debug for ContentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentConfig")
            .field("backend", &self.backend)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("root_dir", &self.root_dir)
            .field("prefix_root", &self.prefix_root)
            .field("max_list_pages", &self.max_list_pages)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("enrich_concurrency", &self.enrich_concurrency)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS origins allowed to call the API.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" for development, "json" for production log shipping.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.wellnest/config.toml).
    ///
    /// Environment variables override the file:
    /// - `DATABASE_URL`
    /// - `AWS_S3_BUCKET`, `AWS_REGION`, `AWS_ENDPOINT_URL`
    /// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
    /// - `WELLNEST_PORT`, `WELLNEST_LOG_FORMAT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(bucket) = lookup("AWS_S3_BUCKET") {
            self.content.bucket = Some(bucket);
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.content.region = region;
        }
        if let Some(endpoint) = lookup("AWS_ENDPOINT_URL") {
            self.content.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup("AWS_ACCESS_KEY_ID") {
            self.content.access_key_id = Some(key);
        }
        if let Some(secret) = lookup("AWS_SECRET_ACCESS_KEY") {
            self.content.secret_access_key = Some(secret);
        }
        if let Some(port) = lookup("WELLNEST_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("WELLNEST_PORT is not a valid port: {port}"))
            })?;
        }
        if let Some(format) = lookup("WELLNEST_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".wellnest")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.database.backend.as_str(), "postgres" | "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "database.backend must be postgres, sqlite or memory, got '{}'",
                self.database.backend
            )));
        }

        if !matches!(self.content.backend.as_str(), "s3" | "filesystem" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "content.backend must be s3, filesystem or none, got '{}'",
                self.content.backend
            )));
        }

        if self.content.max_list_pages == 0 {
            return Err(ConfigError::ValidationError(
                "content.max_list_pages must be at least 1".into(),
            ));
        }

        if self.content.enrich_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "content.enrich_concurrency must be at least 1".into(),
            ));
        }

        if self.content.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "content.request_timeout_secs must be at least 1".into(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be pretty or json, got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
