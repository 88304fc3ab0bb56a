//! Error types for the WellNest domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external store has its own error enum; [`Error`] is the request-level
//! error the gateway maps to HTTP status codes.

use thiserror::Error;

/// The top-level error type for retrieval operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Structured store errors ---
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    // --- Request boundary ---
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Activity not found: {0}")]
    NotFound(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Store errors ---

/// Failures of the structured store. Any of these aborts the whole request.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog store unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog query failed: {0}")]
    QueryFailed(String),

    #[error("Catalog schema setup failed: {0}")]
    SchemaFailed(String),
}

/// Failures of the content store. These are scoped to a single activity.
#[derive(Debug, Clone, Error)]
pub enum ContentError {
    #[error("Content store unavailable: {0}")]
    Unavailable(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Content store call timed out after {timeout_secs}s: {operation}")]
    Timeout { operation: String, timeout_secs: u64 },

    #[error("Content store request failed: {message} (status: {status_code})")]
    RequestFailed { status_code: u16, message: String },

    #[error("Invalid content store response: {0}")]
    InvalidResponse(String),

    #[error("Content store not configured: {0}")]
    NotConfigured(String),
}
