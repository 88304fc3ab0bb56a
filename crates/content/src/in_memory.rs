//! In-memory content store — useful for testing and demos.

use async_trait::async_trait;
use std::collections::BTreeMap;
use wellnest_core::content::{ContentStore, ObjectPage};
use wellnest_core::error::ContentError;

/// Objects held in a sorted map. Listings come back in key order, split into
/// pages of `page_size` keys; the continuation token is the last key of the
/// previous page.
#[derive(Debug, Clone)]
pub struct InMemoryContentStore {
    objects: BTreeMap<String, Vec<u8>>,
    page_size: usize,
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: 1000,
        }
    }
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: limit listings to `page_size` keys per page (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Builder: add an object.
    pub fn with_object(mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(key, bytes);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.insert(key.into(), bytes.into());
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ObjectPage, ContentError> {
        let mut matching = self
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .filter(|k| continuation.is_none_or(|after| k.as_str() > after));

        let keys: Vec<String> = matching.by_ref().take(self.page_size).cloned().collect();
        let next_token = match (matching.next(), keys.last()) {
            (Some(_), Some(last)) => Some(last.clone()),
            _ => None,
        };
        Ok(ObjectPage { keys, next_token })
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, ContentError> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(key.to_string()))
    }
}
