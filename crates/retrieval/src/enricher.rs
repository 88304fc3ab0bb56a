//! Asset enricher — attaches flashcard images to an activity.
//!
//! For activity `A1` the enricher lists `{prefix_root}/A1/flashcards/`,
//! keeps `png`/`jpg`/`jpeg` keys, fetches each one and stores it base64
//! encoded under its step name (`step1.png` → `step1`).
//!
//! Content-store trouble never escapes: the activity gets an empty bundle
//! and a `failed` status, and the caller carries on with its siblings.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use wellnest_core::content::ContentStore;
use wellnest_core::error::ContentError;
use wellnest_core::{AssetBundle, EnrichmentStatus};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Enricher settings.
#[derive(Debug, Clone)]
pub struct EnricherConfig {
    /// Key prefix above the per-activity folders.
    pub prefix_root: String,
    /// Listing pages to follow before giving up and reporting `truncated`.
    pub max_list_pages: usize,
    /// Deadline for each individual content-store call.
    pub call_timeout: Duration,
    /// Activities enriched at once.
    pub concurrency: usize,
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            prefix_root: "master/selected_activities".into(),
            max_list_pages: 10,
            call_timeout: Duration::from_secs(10),
            concurrency: 4,
        }
    }
}

/// Attaches flashcards from a [`ContentStore`].
pub struct AssetEnricher {
    content: Arc<dyn ContentStore>,
    config: EnricherConfig,
}

impl AssetEnricher {
    pub fn new(content: Arc<dyn ContentStore>, config: EnricherConfig) -> Self {
        Self { content, config }
    }

    pub fn content(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    /// The folder holding an activity's flashcards.
    pub fn prefix_for(&self, activity_id: &str) -> String {
        format!(
            "{}/{activity_id}/flashcards/",
            self.config.prefix_root.trim_end_matches('/')
        )
    }

    /// Build the bundle for one activity. Never fails.
    pub async fn enrich(&self, activity_id: &str) -> (AssetBundle, EnrichmentStatus) {
        if activity_id.trim().is_empty() {
            debug!("Activity without identifier, skipping enrichment");
            return (AssetBundle::new(), EnrichmentStatus::Empty);
        }

        match self.collect(activity_id).await {
            Ok((bundle, Some(pages_read))) => (bundle, EnrichmentStatus::Truncated { pages_read }),
            Ok((bundle, None)) if bundle.is_empty() => (bundle, EnrichmentStatus::Empty),
            Ok((bundle, None)) => (bundle, EnrichmentStatus::Complete),
            Err(e) => {
                warn!(
                    activity_id,
                    content = self.content.name(),
                    error = %e,
                    "Flashcard enrichment failed, returning empty instructions"
                );
                (
                    AssetBundle::new(),
                    EnrichmentStatus::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    /// List and fetch. The second element is `Some(pages_read)` when the
    /// listing was cut short by the page cap.
    async fn collect(
        &self,
        activity_id: &str,
    ) -> Result<(AssetBundle, Option<usize>), ContentError> {
        let prefix = self.prefix_for(activity_id);
        let (keys, truncated_after) = self.list_all(&prefix).await?;

        let mut bundle = AssetBundle::new();
        for key in keys.iter().filter(|k| is_image(k)) {
            let Some(step) = step_key(key) else {
                continue;
            };
            let bytes = self
                .timed(format!("fetch {key}"), self.content.fetch(key))
                .await?;
            if bundle.insert(&step, STANDARD.encode(&bytes)).is_some() {
                warn!(activity_id, step = %step, key = %key, "Duplicate flashcard step, keeping the later object");
            }
        }

        debug!(activity_id, listed = keys.len(), steps = bundle.len(), "Flashcards collected");
        Ok((bundle, truncated_after))
    }

    /// Follow continuation tokens up to the page cap.
    async fn list_all(&self, prefix: &str) -> Result<(Vec<String>, Option<usize>), ContentError> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        for page_no in 1..=self.config.max_list_pages.max(1) {
            let page = self
                .timed(format!("list {prefix}"), self.content.list(prefix, token.as_deref()))
                .await?;
            keys.extend(page.keys);

            match page.next_token {
                None => return Ok((keys, None)),
                Some(next) => token = Some(next),
            }
            debug!(prefix, page_no, "Listing continues");
        }

        warn!(
            prefix,
            max_pages = self.config.max_list_pages,
            "Flashcard listing truncated at page cap"
        );
        Ok((keys, Some(self.config.max_list_pages.max(1))))
    }

    async fn timed<T>(
        &self,
        operation: String,
        call: impl Future<Output = Result<T, ContentError>>,
    ) -> Result<T, ContentError> {
        match tokio::time::timeout(self.config.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ContentError::Timeout {
                operation,
                timeout_secs: self.config.call_timeout.as_secs(),
            }),
        }
    }
}

/// True for `png`, `jpg` and `jpeg` keys, in any letter case.
pub fn is_image(key: &str) -> bool {
    let name = file_name(key);
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Step name for a key: the final path segment minus its last extension.
/// `None` when nothing is left (e.g. `.png`).
pub fn step_key(key: &str) -> Option<String> {
    let name = file_name(key);
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    (!stem.is_empty()).then(|| stem.to_string())
}

fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
