//! Retrieval service — composer, enricher and response assembly.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use wellnest_core::catalog::CatalogStore;
use wellnest_core::content::ContentStore;
use wellnest_core::error::{Error, Result};
use wellnest_core::{ActivityRecord, ActivityResponse, EnrichedActivity, FilterCriteria};

use crate::composer::ActivityComposer;
use crate::enricher::{AssetEnricher, EnricherConfig};

/// Answers retrieval requests. Holds no per-request state, so one instance
/// is shared by every handler.
pub struct RetrievalService {
    composer: ActivityComposer,
    enricher: AssetEnricher,
}

impl RetrievalService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        content: Arc<dyn ContentStore>,
        config: EnricherConfig,
    ) -> Self {
        Self {
            composer: ActivityComposer::new(catalog),
            enricher: AssetEnricher::new(content, config),
        }
    }

    pub fn catalog_name(&self) -> &str {
        self.composer.catalog().name()
    }

    pub fn content_name(&self) -> &str {
        self.enricher.content().name()
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        self.composer.catalog()
    }

    /// Fetch every activity matching `criteria`, with its flashcards.
    ///
    /// Catalog failure fails the whole request. Enrichment failures are
    /// reported per activity through its status.
    pub async fn fetch_activities(&self, criteria: FilterCriteria) -> Result<ActivityResponse> {
        let started = Instant::now();
        let candidates = self.composer.compose(&criteria).await?;
        let activities = self.enrich_all(candidates).await;
        let response = ActivityResponse::new(criteria, activities);

        info!(
            count = response.count(),
            failed = response.failed_enrichments(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Activities retrieved"
        );
        Ok(response)
    }

    /// Fetch one activity by identifier, with its flashcards.
    pub async fn get_activity(&self, activity_id: &str) -> Result<EnrichedActivity> {
        let record = self
            .composer
            .catalog()
            .get(activity_id)
            .await?
            .ok_or_else(|| Error::NotFound(activity_id.to_string()))?;
        let (instructions, status) = self.enricher.enrich(&record.id).await;
        Ok(EnrichedActivity::new(record, instructions, status))
    }

    /// Enrich candidates concurrently, keeping their order.
    async fn enrich_all(&self, candidates: Vec<ActivityRecord>) -> Vec<EnrichedActivity> {
        let concurrency = self.enricher.config().concurrency.max(1);
        stream::iter(candidates)
            .map(|record| async move {
                let (instructions, status) = self.enricher.enrich(&record.id).await;
                EnrichedActivity::new(record, instructions, status)
            })
            .buffered(concurrency)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use wellnest_catalog::InMemoryCatalog;
    use wellnest_content::InMemoryContentStore;
    use wellnest_core::catalog::CatalogQuery;
    use wellnest_core::content::ObjectPage;
    use wellnest_core::error::{CatalogError, ContentError};
    use wellnest_core::EnrichmentStatus;

    const ROOT: &str = "master/selected_activities";

    fn record(id: &str, age: u32, diagnosis: &str, themes: &[&str]) -> ActivityRecord {
        let mut r = ActivityRecord::new(id);
        r.name = Some(format!("Activity {id}"));
        r.age = Some(age);
        r.diagnosis = Some(diagnosis.into());
        r.themes = themes.iter().map(|t| t.to_string()).collect();
        r
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(InMemoryCatalog::new(vec![
            record("A1", 8, "Mild ADHD, anxiety", &["Emotional Regulation", "Motor Skills"]),
            record("A2", 8, "Dyslexia", &["Social Skills"]),
            record("A3", 10, "ADHD", &["Motor Skills"]),
        ]))
    }

    fn content() -> Arc<InMemoryContentStore> {
        Arc::new(
            InMemoryContentStore::new()
                .with_object(format!("{ROOT}/A1/flashcards/step1.png"), b"a1-step1".to_vec())
                .with_object(format!("{ROOT}/A1/flashcards/step2.jpg"), b"a1-step2".to_vec())
                .with_object(format!("{ROOT}/A3/flashcards/step1.png"), b"a3-step1".to_vec()),
        )
    }

    fn service() -> RetrievalService {
        RetrievalService::new(catalog(), content(), EnricherConfig::default())
    }

    #[tokio::test]
    async fn a1_scenario() {
        let criteria = FilterCriteria::parse(Some("8"), Some("adhd"), Some("motor skills")).unwrap();
        let response = service().fetch_activities(criteria).await.unwrap();

        assert_eq!(response.count(), 1);
        let a1 = &response.activities()[0];
        assert_eq!(a1.id(), "A1");
        assert_eq!(a1.status, EnrichmentStatus::Complete);
        assert_eq!(a1.instructions.get("step1"), Some(STANDARD.encode(b"a1-step1").as_str()));
        assert_eq!(a1.instructions.get("step2"), Some(STANDARD.encode(b"a1-step2").as_str()));
    }

    #[tokio::test]
    async fn unconstrained_returns_all_in_catalog_order() {
        let response = service()
            .fetch_activities(FilterCriteria::default())
            .await
            .unwrap();
        let ids: Vec<&str> = response.activities().iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3"]);
        assert_eq!(response.count(), response.activities().len());
    }

    #[tokio::test]
    async fn order_survives_serial_enrichment() {
        let config = EnricherConfig {
            concurrency: 1,
            ..Default::default()
        };
        let svc = RetrievalService::new(catalog(), content(), config);
        let response = svc.fetch_activities(FilterCriteria::default()).await.unwrap();
        let ids: Vec<&str> = response.activities().iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3"]);
    }

    #[tokio::test]
    async fn assets_never_cross_activities() {
        let response = service()
            .fetch_activities(FilterCriteria::default())
            .await
            .unwrap();
        let by_id = |id: &str| {
            response
                .activities()
                .iter()
                .find(|a| a.id() == id)
                .unwrap()
                .clone()
        };
        assert_eq!(by_id("A1").instructions.len(), 2);
        assert!(by_id("A2").instructions.is_empty());
        assert_eq!(by_id("A2").status, EnrichmentStatus::Empty);
        assert_eq!(
            by_id("A3").instructions.get("step1"),
            Some(STANDARD.encode(b"a3-step1").as_str())
        );
    }

    #[tokio::test]
    async fn no_match_is_empty_success() {
        let criteria = FilterCriteria::new(Some(99), None, vec![]);
        let response = service().fetch_activities(criteria).await.unwrap();
        assert_eq!(response.count(), 0);
        assert!(response.activities().is_empty());
    }

    #[tokio::test]
    async fn get_activity_enriches_one() {
        let svc = service();
        let a1 = svc.get_activity("A1").await.unwrap();
        assert_eq!(a1.instructions.len(), 2);
        assert!(matches!(
            svc.get_activity("missing").await,
            Err(Error::NotFound(_))
        ));
    }

    struct DownCatalog;

    #[async_trait]
    impl CatalogStore for DownCatalog {
        fn name(&self) -> &str {
            "down"
        }

        async fn find(&self, _: &CatalogQuery) -> std::result::Result<Vec<ActivityRecord>, CatalogError> {
            Err(CatalogError::Unavailable("connection refused".into()))
        }

        async fn get(&self, _: &str) -> std::result::Result<Option<ActivityRecord>, CatalogError> {
            Err(CatalogError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn catalog_failure_is_an_error_not_an_empty_list() {
        let svc = RetrievalService::new(Arc::new(DownCatalog), content(), EnricherConfig::default());
        let err = svc.fetch_activities(FilterCriteria::default()).await.unwrap_err();
        assert!(matches!(err, Error::Catalog(CatalogError::Unavailable(_))));
    }

    /// Fails listings for one activity only.
    struct FailsFor {
        inner: Arc<InMemoryContentStore>,
        bad_prefix: String,
    }

    #[async_trait]
    impl ContentStore for FailsFor {
        fn name(&self) -> &str {
            "fails_for"
        }

        async fn list(
            &self,
            prefix: &str,
            continuation: Option<&str>,
        ) -> std::result::Result<ObjectPage, ContentError> {
            if prefix == self.bad_prefix {
                return Err(ContentError::Unavailable("bucket unreachable".into()));
            }
            self.inner.list(prefix, continuation).await
        }

        async fn fetch(&self, key: &str) -> std::result::Result<Vec<u8>, ContentError> {
            self.inner.fetch(key).await
        }
    }

    #[tokio::test]
    async fn one_failed_enrichment_spares_siblings() {
        let store = FailsFor {
            inner: content(),
            bad_prefix: format!("{ROOT}/A1/flashcards/"),
        };
        let svc = RetrievalService::new(catalog(), Arc::new(store), EnricherConfig::default());
        let response = svc.fetch_activities(FilterCriteria::default()).await.unwrap();

        assert_eq!(response.count(), 3);
        assert_eq!(response.failed_enrichments(), 1);
        let a1 = &response.activities()[0];
        assert!(a1.status.is_failed());
        assert!(a1.instructions.is_empty());
        assert_eq!(response.activities()[2].status, EnrichmentStatus::Complete);
    }

    /// Listings take longer for lower activity numbers, so earlier
    /// activities finish last. Tracks the number of listings in flight.
    #[derive(Default)]
    struct SlowFirst {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for SlowFirst {
        fn name(&self) -> &str {
            "slow_first"
        }

        async fn list(
            &self,
            prefix: &str,
            _continuation: Option<&str>,
        ) -> std::result::Result<ObjectPage, ContentError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let n: u64 = prefix
                .split('/')
                .find_map(|seg| seg.strip_prefix('A'))
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(100 * (20 - n))).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ObjectPage::default())
        }

        async fn fetch(&self, key: &str) -> std::result::Result<Vec<u8>, ContentError> {
            Err(ContentError::NotFound(key.to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_concurrency_keeps_catalog_order() {
        let expected: Vec<String> = (0..12).map(|i| format!("A{i}")).collect();
        let catalog = InMemoryCatalog::new(
            expected
                .iter()
                .map(|id| record(id, 8, "ADHD", &["Motor Skills"]))
                .collect(),
        );
        let store = Arc::new(SlowFirst::default());
        let config = EnricherConfig {
            concurrency: 3,
            ..Default::default()
        };
        let svc = RetrievalService::new(Arc::new(catalog), store.clone(), config);

        let response = svc.fetch_activities(FilterCriteria::default()).await.unwrap();

        let ids: Vec<&str> = response.activities().iter().map(|a| a.id()).collect();
        assert_eq!(ids, expected);
        assert_eq!(store.peak.load(Ordering::SeqCst), 3);
        assert_eq!(store.in_flight.load(Ordering::SeqCst), 0);
        assert!(response.activities().iter().all(|a| a.status == EnrichmentStatus::Empty));
    }

    #[tokio::test]
    async fn backend_names() {
        let svc = service();
        assert_eq!(svc.catalog_name(), "in_memory");
        assert_eq!(svc.content_name(), "in_memory");
    }
}
