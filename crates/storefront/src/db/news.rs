//! News repository.

use sqlx::SqlitePool;

use gameverse_core::NewsId;

use super::RepositoryError;
use crate::models::NewsItem;

#[derive(Debug, sqlx::FromRow)]
struct NewsRow {
    id: i32,
    title: String,
    summary: String,
    image_url: String,
}

impl From<NewsRow> for NewsItem {
    fn from(row: NewsRow) -> Self {
        Self {
            id: NewsId::new(row.id),
            title: row.title,
            summary: row.summary,
            image_url: row.image_url,
        }
    }
}

/// Repository for news database operations.
pub struct NewsRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NewsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all news items ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<NewsItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, NewsRow>(
            "SELECT id, title, summary, image_url FROM news ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(NewsItem::from).collect())
    }

    /// Insert or replace news items by ID in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any write fails.
    pub async fn upsert_all(&self, items: &[NewsItem]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            sqlx::query(
                r"
                INSERT INTO news (id, title, summary, image_url)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (id) DO UPDATE SET
                    title = excluded.title,
                    summary = excluded.summary,
                    image_url = excluded.image_url
                ",
            )
            .bind(item.id.as_i32())
            .bind(item.title.as_str())
            .bind(item.summary.as_str())
            .bind(item.image_url.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Count stored news items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
