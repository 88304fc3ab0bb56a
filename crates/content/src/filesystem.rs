//! Filesystem content store — a directory tree standing in for a bucket.
//!
//! Object keys are paths relative to the root directory, always with `/`
//! separators. Handy for local development: mirror the bucket layout under
//! a directory and point `content.root_dir` at it.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use wellnest_core::content::{ContentStore, ObjectPage};
use wellnest_core::error::ContentError;

/// A content store reading from a local directory.
pub struct FilesystemContentStore {
    root: PathBuf,
}

impl FilesystemContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key (or key prefix) under the root, refusing anything that
    /// could escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf, ContentError> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ContentError::NotFound(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    /// Walk `dir` recursively, collecting root-relative keys of regular files.
    async fn walk(&self, dir: PathBuf) -> Result<Vec<String>, ContentError> {
        let mut keys = Vec::new();
        let mut pending = vec![dir];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(ContentError::Unavailable(format!(
                        "Failed to read {}: {e}",
                        dir.display()
                    )));
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| ContentError::Unavailable(format!("Directory walk failed: {e}")))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| ContentError::Unavailable(format!("Directory walk failed: {e}")))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    if let Some(key) = self.key_for(&path) {
                        keys.push(key);
                    }
                }
            }
        }

        Ok(keys)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    /// Returns every matching key in a single page.
    async fn list(
        &self,
        prefix: &str,
        _continuation: Option<&str>,
    ) -> Result<ObjectPage, ContentError> {
        let dir_part = prefix.rfind('/').map(|i| &prefix[..i]).unwrap_or("");
        let dir = match self.resolve(dir_part) {
            Ok(dir) => dir,
            Err(_) => return Ok(ObjectPage::default()),
        };

        let mut keys: Vec<String> = self
            .walk(dir)
            .await?
            .into_iter()
            .filter(|k| k.starts_with(prefix.trim_start_matches('/')))
            .collect();
        keys.sort();

        debug!(prefix, keys = keys.len(), "Filesystem listing");
        Ok(ObjectPage::last(keys))
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, ContentError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ContentError::NotFound(key.to_string()),
            _ => ContentError::Unavailable(format!("Failed to read {key}: {e}")),
        })
    }
}
