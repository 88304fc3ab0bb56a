//! Store wiring — builds the catalog, content store and retrieval service
//! from configuration. Called once at startup; the results are shared by
//! every request.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use wellnest_catalog::{InMemoryCatalog, PostgresCatalog, SqliteCatalog};
use wellnest_config::{AppConfig, ContentConfig, DatabaseConfig};
use wellnest_content::{
    Credentials, FilesystemContentStore, NoopContentStore, S3ContentStore, S3Settings,
};
use wellnest_core::catalog::CatalogStore;
use wellnest_core::content::ContentStore;
use wellnest_core::error::{CatalogError, ContentError};
use wellnest_retrieval::{EnricherConfig, RetrievalService};

/// Startup failures.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Open the structured store named by `database.backend`.
pub async fn build_catalog(config: &DatabaseConfig) -> Result<Arc<dyn CatalogStore>, CatalogError> {
    match config.backend.as_str() {
        "postgres" => {
            let url = config.url.as_deref().ok_or_else(|| {
                CatalogError::Unavailable("database.url (or DATABASE_URL) is not set".into())
            })?;
            Ok(Arc::new(PostgresCatalog::connect(url, config.max_connections).await?))
        }
        "sqlite" => {
            let url = config.url.as_deref().unwrap_or("sqlite://wellnest.db");
            Ok(Arc::new(SqliteCatalog::new(url).await?))
        }
        "memory" => {
            warn!("Using an empty in-memory activity catalog");
            Ok(Arc::new(InMemoryCatalog::default()))
        }
        other => Err(CatalogError::Unavailable(format!(
            "Unknown database backend '{other}'"
        ))),
    }
}

/// Open the content store named by `content.backend`.
///
/// An `s3` backend without a bucket or credentials degrades to the no-op
/// store: activities are served with empty instructions.
pub fn build_content(config: &ContentConfig) -> Result<Arc<dyn ContentStore>, ContentError> {
    match config.backend.as_str() {
        "s3" => {
            let (Some(bucket), Some(access_key_id), Some(secret_access_key)) = (
                config.bucket.clone(),
                config.access_key_id.clone(),
                config.secret_access_key.clone(),
            ) else {
                warn!("S3 bucket or credentials missing, flashcards disabled");
                return Ok(Arc::new(NoopContentStore));
            };
            let store = S3ContentStore::new(S3Settings {
                bucket,
                region: config.region.clone(),
                endpoint: config.endpoint.clone(),
                credentials: Credentials {
                    access_key_id,
                    secret_access_key,
                },
                timeout: Duration::from_secs(config.request_timeout_secs),
            })?;
            info!(region = %config.region, "S3 content store ready");
            Ok(Arc::new(store))
        }
        "filesystem" => {
            let root = config.root_dir.as_deref().ok_or_else(|| {
                ContentError::NotConfigured("content.root_dir is required for the filesystem backend".into())
            })?;
            info!(root, "Filesystem content store ready");
            Ok(Arc::new(FilesystemContentStore::new(root)))
        }
        "none" => Ok(Arc::new(NoopContentStore)),
        other => Err(ContentError::NotConfigured(format!(
            "Unknown content backend '{other}'"
        ))),
    }
}

/// Enricher settings from `[content]`.
pub fn enricher_config(config: &ContentConfig) -> EnricherConfig {
    EnricherConfig {
        prefix_root: config.prefix_root.clone(),
        max_list_pages: config.max_list_pages,
        call_timeout: Duration::from_secs(config.request_timeout_secs),
        concurrency: config.enrich_concurrency,
    }
}

/// Build the retrieval service with both stores.
pub async fn build_service(config: &AppConfig) -> Result<RetrievalService, SetupError> {
    let catalog = build_catalog(&config.database).await?;
    let content = build_content(&config.content)?;
    info!(
        catalog = catalog.name(),
        content = content.name(),
        "Retrieval service wired"
    );
    Ok(RetrievalService::new(
        catalog,
        content,
        enricher_config(&config.content),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s3_without_credentials_falls_back_to_none() {
        let config = ContentConfig {
            bucket: Some("wellnest-media".into()),
            ..Default::default()
        };
        assert_eq!(build_content(&config).unwrap().name(), "none");
    }

    #[test]
    fn s3_with_credentials() {
        let config = ContentConfig {
            bucket: Some("wellnest-media".into()),
            access_key_id: Some("AKID".into()),
            secret_access_key: Some("secret".into()),
            ..Default::default()
        };
        assert_eq!(build_content(&config).unwrap().name(), "s3");
    }

    #[test]
    fn filesystem_requires_root() {
        let config = ContentConfig {
            backend: "filesystem".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_content(&config),
            Err(ContentError::NotConfigured(_))
        ));

        let config = ContentConfig {
            backend: "filesystem".into(),
            root_dir: Some("/srv/wellnest-media".into()),
            ..Default::default()
        };
        assert_eq!(build_content(&config).unwrap().name(), "filesystem");
    }

    #[test]
    fn enricher_settings_follow_config() {
        let config = ContentConfig {
            prefix_root: "media".into(),
            max_list_pages: 3,
            request_timeout_secs: 7,
            enrich_concurrency: 2,
            ..Default::default()
        };
        let e = enricher_config(&config);
        assert_eq!(e.prefix_root, "media");
        assert_eq!(e.max_list_pages, 3);
        assert_eq!(e.call_timeout, Duration::from_secs(7));
        assert_eq!(e.concurrency, 2);
    }

    #[tokio::test]
    async fn postgres_requires_url() {
        let config = DatabaseConfig::default();
        assert!(matches!(
            build_catalog(&config).await,
            Err(CatalogError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn sqlite_and_memory_catalogs() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
        let config = DatabaseConfig {
            backend: "sqlite".into(),
            url: Some(url),
            ..Default::default()
        };
        assert_eq!(build_catalog(&config).await.unwrap().name(), "sqlite");

        let config = DatabaseConfig {
            backend: "memory".into(),
            ..Default::default()
        };
        assert_eq!(build_catalog(&config).await.unwrap().name(), "in_memory");
    }
}
