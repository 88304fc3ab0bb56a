//! Content store trait — read-only access to flashcard objects.
//!
//! Objects are addressed by key. The store supports two operations:
//! listing keys under a prefix (one page at a time) and fetching an
//! object's bytes.

use async_trait::async_trait;

use crate::error::ContentError;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// Full object keys, in store-defined order.
    pub keys: Vec<String>,
    /// Token for the next page; `None` when the listing is complete.
    pub next_token: Option<String>,
}

impl ObjectPage {
    /// A final page holding `keys`.
    pub fn last(keys: Vec<String>) -> Self {
        Self {
            keys,
            next_token: None,
        }
    }
}

/// The core ContentStore trait.
///
/// Implementations: S3-compatible HTTP, local filesystem, in-memory (for
/// testing), none (unconfigured).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// The backend name (e.g., "s3", "filesystem", "none").
    fn name(&self) -> &str;

    /// List keys under `prefix`, continuing from `continuation` if given.
    async fn list(
        &self,
        prefix: &str,
        continuation: Option<&str>,
    ) -> Result<ObjectPage, ContentError>;

    /// Fetch the raw bytes stored at `key`.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, ContentError>;
}
