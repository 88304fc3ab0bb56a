//! Filter & query composer.
//!
//! Turns [`FilterCriteria`] into a single catalog query, then applies the
//! theme post-filter in memory. The catalog order survives both steps.

use std::sync::Arc;
use tracing::debug;
use wellnest_core::catalog::CatalogStore;
use wellnest_core::error::CatalogError;
use wellnest_core::{ActivityRecord, FilterCriteria};

/// Selects candidate activities from the catalog.
pub struct ActivityComposer {
    catalog: Arc<dyn CatalogStore>,
}

impl ActivityComposer {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    /// Run the catalog query and the theme post-filter.
    ///
    /// A catalog failure is returned as-is; it is never turned into an
    /// empty candidate list.
    pub async fn compose(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<ActivityRecord>, CatalogError> {
        let rows = self.catalog.find(&criteria.catalog_query()).await?;
        let fetched = rows.len();
        let candidates = filter_by_themes(rows, &criteria.theme_keys());

        debug!(
            catalog = self.catalog.name(),
            unconstrained = criteria.is_unconstrained(),
            fetched,
            kept = candidates.len(),
            "Composed candidate set"
        );
        Ok(candidates)
    }
}

/// Keep records matching ANY of `theme_keys` (lowercased). An empty list
/// keeps everything.
pub fn filter_by_themes(records: Vec<ActivityRecord>, theme_keys: &[String]) -> Vec<ActivityRecord> {
    if theme_keys.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| r.matches_any_theme(theme_keys))
        .collect()
}
