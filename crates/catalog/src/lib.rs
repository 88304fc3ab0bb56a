//! Activity catalog implementations for WellNest.
//!
//! All backends read the same table contract:
//!
//! ```sql
//! activities (
//!     id            integer primary key,  -- natural order
//!     activity_id   text,                 -- identifier
//!     age           integer,              -- exact-match filter
//!     diagnosis     text,                 -- substring filter
//!     activity_data json                  -- the activity document
//! )
//! ```

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryCatalog;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCatalog;

#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalog;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
use wellnest_core::error::CatalogError;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
use wellnest_core::ActivityRecord;

/// Decode one `(activity_id, activity_data)` row.
///
/// Rows whose document is missing or not a JSON object are skipped with a
/// warning rather than failing the whole query.
#[cfg(any(feature = "sqlite", feature = "postgres"))]
fn decode_row(activity_id: Option<String>, document: Option<String>) -> Option<ActivityRecord> {
    let row_id = activity_id.unwrap_or_default();
    let Some(document) = document else {
        tracing::warn!(activity_id = %row_id, "Skipping activity row without activity_data");
        return None;
    };
    match ActivityRecord::from_document(&row_id, &document) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(activity_id = %row_id, error = %e, "Skipping malformed activity_data");
            None
        }
    }
}

/// Classify a driver error: connection-level problems are `Unavailable`,
/// everything else is `QueryFailed`.
#[cfg(any(feature = "sqlite", feature = "postgres"))]
fn classify(context: &str, e: sqlx::Error) -> CatalogError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => CatalogError::Unavailable(format!("{context}: {e}")),
        other => CatalogError::QueryFailed(format!("{context}: {other}")),
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn decode_row_falls_back_to_column_id() {
        let record = decode_row(Some("row-1".into()), Some("{}".into())).unwrap();
        assert_eq!(record.id, "row-1");
    }

    #[test]
    fn decode_row_skips_bad_documents() {
        assert!(decode_row(Some("x".into()), None).is_none());
        assert!(decode_row(Some("x".into()), Some("not json".into())).is_none());
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(matches!(
            classify("find", sqlx::Error::PoolTimedOut),
            CatalogError::Unavailable(_)
        ));
        assert!(matches!(
            classify("find", sqlx::Error::RowNotFound),
            CatalogError::QueryFailed(_)
        ));
    }
}
