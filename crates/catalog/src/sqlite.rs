//! SQLite catalog backend.
//!
//! Used for local development and tests. Reads the same `activities` table
//! contract as the PostgreSQL backend, with `activity_data` stored as JSON
//! text. SQLite's `LIKE` is case-insensitive for ASCII only, which covers
//! the diagnosis vocabulary in practice.

use crate::{classify, decode_row};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use wellnest_core::catalog::{CatalogQuery, CatalogStore};
use wellnest_core::error::CatalogError;
use wellnest_core::ActivityRecord;

/// A SQLite activity catalog.
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open a SQLite catalog from a file path.
    ///
    /// The `activities` table is created if missing so a fresh development
    /// database can be seeded directly.
    pub async fn new(path: &str) -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| CatalogError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| CatalogError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let catalog = Self::from_pool(pool).await?;
        info!("SQLite catalog initialized at {path}");
        Ok(catalog)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CatalogError> {
        let catalog = Self { pool };
        catalog.ensure_schema().await?;
        Ok(catalog)
    }

    /// The underlying pool, for seeding.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS activities (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                activity_id   TEXT UNIQUE,
                age           INTEGER,
                diagnosis     TEXT,
                activity_data TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::SchemaFailed(format!("activities table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_activities_age ON activities(age)")
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::SchemaFailed(format!("age index: {e}")))?;

        debug!("SQLite catalog schema ready");
        Ok(())
    }

    fn row_to_record(row: &SqliteRow) -> Option<ActivityRecord> {
        let activity_id = row.try_get::<Option<String>, _>("activity_id").ok().flatten();
        let document = row.try_get::<Option<String>, _>("activity_data").ok().flatten();
        decode_row(activity_id, document)
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find(&self, query: &CatalogQuery) -> Result<Vec<ActivityRecord>, CatalogError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT activity_id, activity_data FROM activities WHERE 1 = 1");
        if let Some(age) = query.age {
            qb.push(" AND age = ").push_bind(i64::from(age));
        }
        if let Some(pattern) = query.diagnosis_pattern() {
            qb.push(" AND diagnosis LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }
        qb.push(" ORDER BY id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify("activity query", e))?;

        debug!(rows = rows.len(), "SQLite catalog query complete");
        Ok(rows.iter().filter_map(Self::row_to_record).collect())
    }

    async fn get(&self, activity_id: &str) -> Result<Option<ActivityRecord>, CatalogError> {
        let row = sqlx::query(
            r#"
            SELECT activity_id, activity_data FROM activities
            WHERE activity_id = ?1
               OR CASE WHEN json_valid(activity_data)
                       THEN json_extract(activity_data, '$."Activity ID"') END = ?1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(activity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify("activity lookup", e))?;

        Ok(row.as_ref().and_then(Self::row_to_record))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| classify("ping", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_catalog() -> SqliteCatalog {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteCatalog::from_pool(pool).await.unwrap()
    }

    async fn seed(
        catalog: &SqliteCatalog,
        id: &str,
        age: Option<i64>,
        diagnosis: Option<&str>,
        document: serde_json::Value,
    ) {
        sqlx::query(
            "INSERT INTO activities (activity_id, age, diagnosis, activity_data) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(age)
        .bind(diagnosis)
        .bind(document.to_string())
        .execute(catalog.pool())
        .await
        .unwrap();
    }

    async fn seeded() -> SqliteCatalog {
        let catalog = test_catalog().await;
        seed(
            &catalog,
            "A1",
            Some(8),
            Some("Mild ADHD, anxiety"),
            json!({"Activity ID": "A1", "Activity Name": "Breathing Buddies", "Age": 8,
                   "Themes": ["Emotional Regulation", "Motor Skills"], "Diagnosis": "Mild ADHD, anxiety"}),
        )
        .await;
        seed(
            &catalog,
            "A2",
            Some(8),
            Some("Dyslexia"),
            json!({"Activity ID": "A2", "Activity Name": "Letter Hunt", "Age": 8}),
        )
        .await;
        seed(
            &catalog,
            "A3",
            None,
            None,
            json!({"Activity ID": "A3", "Activity Name": "Free Play"}),
        )
        .await;
        catalog
    }

    #[tokio::test]
    async fn unconstrained_query_returns_every_row() {
        let catalog = seeded().await;
        let found = catalog.find(&CatalogQuery::default()).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3"]);
    }

    #[tokio::test]
    async fn age_predicate_skips_null_age() {
        let catalog = seeded().await;
        let query = CatalogQuery {
            age: Some(8),
            diagnosis: None,
        };
        let found = catalog.find(&query).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.id != "A3"));
    }

    #[tokio::test]
    async fn diagnosis_substring_case_insensitive() {
        let catalog = seeded().await;
        let query = CatalogQuery {
            age: None,
            diagnosis: Some("adhd".into()),
        };
        let found = catalog.find(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "A1");
        assert_eq!(found[0].themes.len(), 2);
    }

    #[tokio::test]
    async fn diagnosis_wildcards_match_literally() {
        let catalog = seeded().await;
        let query = CatalogQuery {
            age: None,
            diagnosis: Some("%".into()),
        };
        assert!(catalog.find(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_rows_are_skipped() {
        let catalog = seeded().await;
        sqlx::query("INSERT INTO activities (activity_id, age, activity_data) VALUES ('bad', 8, 'not json')")
            .execute(catalog.pool())
            .await
            .unwrap();
        let found = catalog
            .find(&CatalogQuery {
                age: Some(8),
                diagnosis: None,
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn get_by_identifier() {
        let catalog = seeded().await;
        let record = catalog.get("A2").await.unwrap().unwrap();
        assert_eq!(record.name.as_deref(), Some("Letter Hunt"));
        assert!(catalog.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn closed_pool_is_unavailable() {
        let catalog = seeded().await;
        catalog.pool().close().await;
        let err = catalog.find(&CatalogQuery::default()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn ping_and_name() {
        let catalog = test_catalog().await;
        assert!(catalog.ping().await.is_ok());
        assert_eq!(catalog.name(), "sqlite");
    }
}
