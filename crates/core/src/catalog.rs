//! Catalog trait — read-only access to the structured activity store.
//!
//! The store is queried once per request with at most two predicates:
//! exact age and case-insensitive diagnosis substring. Each predicate is
//! omitted entirely when its input is absent. Theme matching is not pushed
//! down; the retrieval layer applies it in memory.

use async_trait::async_trait;

use crate::activity::ActivityRecord;
use crate::error::CatalogError;

/// The predicates pushed down to the structured store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Exact match on the `age` column.
    pub age: Option<u32>,
    /// Case-insensitive substring match on the `diagnosis` column.
    pub diagnosis: Option<String>,
}

impl CatalogQuery {
    /// The diagnosis as a `LIKE` pattern (`%text%`), with `\`, `%` and `_`
    /// escaped so the text matches literally. Use with `ESCAPE '\'`.
    pub fn diagnosis_pattern(&self) -> Option<String> {
        self.diagnosis.as_ref().map(|d| {
            let mut escaped = String::with_capacity(d.len() + 2);
            escaped.push('%');
            for c in d.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped.push('%');
            escaped
        })
    }

    /// Evaluate the query against a record in memory.
    ///
    /// Same semantics as the SQL backends: a record with no age never
    /// matches an age predicate, and likewise for diagnosis.
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        let age_ok = self.age.is_none_or(|age| record.age == Some(age));
        let diagnosis_ok = self.diagnosis.as_ref().is_none_or(|wanted| {
            record
                .diagnosis
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&wanted.to_lowercase()))
        });
        age_ok && diagnosis_ok
    }
}

/// The core CatalogStore trait.
///
/// Implementations: PostgreSQL (production), SQLite, in-memory (for testing).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// The backend name (e.g., "postgres", "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Return every record matching the query, in the store's natural order.
    async fn find(&self, query: &CatalogQuery) -> Result<Vec<ActivityRecord>, CatalogError>;

    /// Look up a single record by identifier.
    async fn get(&self, activity_id: &str) -> Result<Option<ActivityRecord>, CatalogError>;

    /// Check connectivity.
    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(age: Option<u32>, diagnosis: Option<&str>) -> ActivityRecord {
        let mut r = ActivityRecord::new("A1");
        r.age = age;
        r.diagnosis = diagnosis.map(str::to_string);
        r
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = CatalogQuery::default();
        assert!(query.matches(&record(None, None)));
        assert!(query.matches(&record(Some(8), Some("ADHD"))));
    }

    #[test]
    fn age_predicate_excludes_missing_age() {
        let query = CatalogQuery {
            age: Some(8),
            diagnosis: None,
        };
        assert!(query.matches(&record(Some(8), None)));
        assert!(!query.matches(&record(Some(9), None)));
        assert!(!query.matches(&record(None, None)));
    }

    #[test]
    fn diagnosis_is_case_insensitive_substring() {
        let query = CatalogQuery {
            age: None,
            diagnosis: Some("adhd".into()),
        };
        assert!(query.matches(&record(None, Some("Mild ADHD, anxiety"))));
        assert!(!query.matches(&record(None, Some("Dyslexia"))));
        assert!(!query.matches(&record(None, None)));
    }

    #[test]
    fn pattern_escapes_like_metacharacters() {
        let query = CatalogQuery {
            age: None,
            diagnosis: Some("50%_a\\b".into()),
        };
        assert_eq!(query.diagnosis_pattern().unwrap(), "%50\\%\\_a\\\\b%");
        assert!(CatalogQuery::default().diagnosis_pattern().is_none());
    }
}
