//! # WellNest Core
//!
//! Domain types, store traits, and error definitions for the WellNest
//! activity retrieval service. This crate has **no framework dependencies**:
//! it defines the model that the catalog, content, retrieval and gateway
//! crates implement against.
//!
//! ## Design
//!
//! Both external stores are traits defined here:
//! - [`CatalogStore`] — the structured store holding activity records
//! - [`ContentStore`] — the object store holding flashcard images
//!
//! Implementations live in `wellnest-catalog` and `wellnest-content`, so
//! the retrieval pipeline can be exercised against in-memory stores in tests
//! and against PostgreSQL + S3 in production.

pub mod error;
pub mod activity;
pub mod asset;
pub mod catalog;
pub mod content;

// Re-export key types at crate root for ergonomics
pub use error::{CatalogError, ContentError, Error, Result};
pub use activity::{ActivityRecord, FilterCriteria};
pub use asset::{ActivityResponse, AssetBundle, EnrichedActivity, EnrichmentStatus};
pub use catalog::{CatalogQuery, CatalogStore};
pub use content::{ContentStore, ObjectPage};
