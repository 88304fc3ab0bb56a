//! In-memory catalog — useful for testing and demos.

use async_trait::async_trait;
use wellnest_core::catalog::{CatalogQuery, CatalogStore};
use wellnest_core::error::CatalogError;
use wellnest_core::ActivityRecord;

/// A catalog backed by a fixed list of records.
/// Insertion order is the natural return order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Vec<ActivityRecord>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<ActivityRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn find(&self, query: &CatalogQuery) -> Result<Vec<ActivityRecord>, CatalogError> {
        Ok(self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    async fn get(&self, activity_id: &str) -> Result<Option<ActivityRecord>, CatalogError> {
        Ok(self.records.iter().find(|r| r.id == activity_id).cloned())
    }
}
