//! Content store implementations for WellNest.
//!
//! Flashcard images live under `{prefix_root}/{activity_id}/flashcards/`.
//! Backends only list and fetch; they never write.

pub mod filesystem;
pub mod in_memory;
pub mod noop;
pub mod s3;
pub mod sigv4;

pub use filesystem::FilesystemContentStore;
pub use in_memory::InMemoryContentStore;
pub use noop::NoopContentStore;
pub use s3::{S3ContentStore, S3Settings};
pub use sigv4::Credentials;
