//! No-op content store — no object storage configured.
//!
//! Every listing is empty, so activities come back with empty bundles.

use async_trait::async_trait;
use wellnest_core::content::{ContentStore, ObjectPage};
use wellnest_core::error::ContentError;

/// A content store that holds nothing.
pub struct NoopContentStore;

#[async_trait]
impl ContentStore for NoopContentStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn list(
        &self,
        _prefix: &str,
        _continuation: Option<&str>,
    ) -> Result<ObjectPage, ContentError> {
        Ok(ObjectPage::default())
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, ContentError> {
        Err(ContentError::NotFound(key.to_string()))
    }
}
