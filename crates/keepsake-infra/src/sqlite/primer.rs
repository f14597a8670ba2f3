//! SQLite primer repository implementation.
//!
//! Implements `PrimerRepository` from `keepsake-core`. One row per handle;
//! `upsert_primer` replaces any existing row so the last rebuild wins.

use keepsake_core::repository::primer::PrimerRepository;
use keepsake_types::error::RepositoryError;
use keepsake_types::handle::Handle;
use keepsake_types::memory::MemoryPrimer;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `PrimerRepository`.
pub struct SqlitePrimerRepository {
    pool: DatabasePool,
}

impl SqlitePrimerRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

impl PrimerRepository for SqlitePrimerRepository {
    async fn upsert_primer(&self, primer: &MemoryPrimer) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO primers (handle, markdown, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT (handle) DO UPDATE SET markdown = excluded.markdown, updated_at = excluded.updated_at"#,
        )
        .bind(primer.handle.as_str())
        .bind(&primer.markdown)
        .bind(primer.updated_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_primer(&self, handle: &Handle) -> Result<Option<MemoryPrimer>, RepositoryError> {
        let row = sqlx::query("SELECT handle, markdown, updated_at FROM primers WHERE handle = ?")
            .bind(handle.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let handle: String = row
                    .try_get("handle")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let markdown: String = row
                    .try_get("markdown")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let updated_at: String = row
                    .try_get("updated_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;

                Ok(Some(MemoryPrimer {
                    handle: Handle::normalize(Some(&handle)),
                    markdown,
                    updated_at: parse_datetime(&updated_at)?,
                }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_primer(handle: &str, markdown: &str) -> MemoryPrimer {
        MemoryPrimer {
            handle: Handle::normalize(Some(handle)),
            markdown: markdown.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get_primer() {
        let pool = test_pool().await;
        let repo = SqlitePrimerRepository::new(pool);

        let primer = make_primer("margaret", "# Memory Primer: margaret\n");
        repo.upsert_primer(&primer).await.unwrap();

        let handle = Handle::normalize(Some("margaret"));
        let found = repo.get_primer(&handle).await.unwrap().unwrap();
        assert_eq!(found.handle.as_str(), "margaret");
        assert_eq!(found.markdown, "# Memory Primer: margaret\n");
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let pool = test_pool().await;
        let repo = SqlitePrimerRepository::new(pool);

        repo.upsert_primer(&make_primer("margaret", "old")).await.unwrap();
        repo.upsert_primer(&make_primer("margaret", "new")).await.unwrap();

        let handle = Handle::normalize(Some("margaret"));
        let found = repo.get_primer(&handle).await.unwrap().unwrap();
        assert_eq!(found.markdown, "new");
    }

    #[tokio::test]
    async fn test_get_missing_primer_returns_none() {
        let pool = test_pool().await;
        let repo = SqlitePrimerRepository::new(pool);

        let handle = Handle::normalize(Some("nobody"));
        let found = repo.get_primer(&handle).await.unwrap();
        assert!(found.is_none());
    }
}
