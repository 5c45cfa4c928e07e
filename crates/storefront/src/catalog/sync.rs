//! Background catalog sync.
//!
//! Fetches games from the remote catalog and upserts them into the local
//! store. The live product feed picks the new rows up by itself; callers that
//! care about the outcome can watch the returned [`SyncStatus`].

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{error, info, instrument};

use super::CatalogSource;
use super::conversions::convert_items;
use crate::db::Store;
use crate::error::AppError;

/// Progress of a background sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Pending,
    /// Finished; `count` products were written.
    Completed { count: usize },
    /// Failed with the given message. Local data is untouched.
    Failed(String),
}

impl SyncStatus {
    /// Whether the sync has finished, successfully or not.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Fetch `query` from `source` and upsert the mapped products.
///
/// Returns the number of products written.
///
/// # Errors
///
/// Returns `AppError::Catalog` if the fetch fails and `AppError::Database`
/// if the upsert fails.
#[instrument(skip(source, store), fields(query = %query))]
pub async fn sync_catalog(
    source: &dyn CatalogSource,
    store: &dyn Store,
    query: &str,
    price_rate: Decimal,
) -> Result<usize, AppError> {
    let items = source.search(query).await?;
    let products = convert_items(&items, price_rate);

    if products.is_empty() {
        info!(fetched = items.len(), "Catalog sync found nothing to write");
        return Ok(0);
    }

    store.upsert_products(&products).await?;
    info!(
        fetched = items.len(),
        written = products.len(),
        "Catalog sync complete"
    );
    Ok(products.len())
}

/// Spawn a fire-and-forget catalog sync.
///
/// The task is detached; nothing waits for it. Failures, including a panic
/// inside the sync, are logged and reported to Sentry, then published as
/// [`SyncStatus::Failed`]. The status never stays `Pending` once the task
/// has ended.
pub fn spawn_sync(
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn Store>,
    query: String,
    price_rate: Decimal,
) -> watch::Receiver<SyncStatus> {
    let (tx, rx) = watch::channel(SyncStatus::Pending);

    info!("Spawning background catalog sync task");
    tokio::spawn(async move {
        let work = tokio::spawn(async move {
            sync_catalog(source.as_ref(), store.as_ref(), &query, price_rate).await
        });
        let result = work
            .await
            .unwrap_or_else(|e| Err(AppError::Internal(format!("catalog sync task aborted: {e}"))));

        let status = match result {
            Ok(count) => SyncStatus::Completed { count },
            Err(e) => {
                error!(error = %e, "Background catalog sync failed");
                e.capture();
                SyncStatus::Failed(e.to_string())
            }
        };
        // Nobody listening is fine.
        let _ = tx.send(status);
    });

    rx
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use gameverse_core::ProductId;

    use super::*;
    use crate::catalog::CatalogError;
    use crate::catalog::types::{GameInfo, RawItem};
    use crate::db::Database;

    struct FixedCatalog(Vec<RawItem>);

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        async fn search(&self, _query: &str) -> Result<Vec<RawItem>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl CatalogSource for BrokenCatalog {
        async fn search(&self, _query: &str) -> Result<Vec<RawItem>, CatalogError> {
            Err(CatalogError::Api("service unavailable".to_string()))
        }
    }

    struct PanickingCatalog;

    #[async_trait]
    impl CatalogSource for PanickingCatalog {
        async fn search(&self, _query: &str) -> Result<Vec<RawItem>, CatalogError> {
            panic!("malformed upstream state");
        }
    }

    fn game(id: i32, name: &str) -> RawItem {
        RawItem {
            game_info: Some(GameInfo {
                id: Some(id),
                name: Some(name.to_string()),
                lowest_price: Some(10.0),
                ..GameInfo::default()
            }),
            ..RawItem::default()
        }
    }

    async fn finished(mut rx: watch::Receiver<SyncStatus>) -> SyncStatus {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(SyncStatus::is_finished))
            .await
            .unwrap()
            .unwrap();
        rx.borrow().clone()
    }

    #[tokio::test]
    async fn test_sync_upserts_mapped_products() {
        let db = Database::in_memory().await.unwrap();
        let source = FixedCatalog(vec![game(100, "Hades"), RawItem::default()]);

        let count = sync_catalog(&source, &db, "", Decimal::from(950))
            .await
            .unwrap();
        assert_eq!(count, 1);

        let products = db.products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::new(100));
        assert_eq!(products[0].price.amount(), Decimal::from(9500));
    }

    #[tokio::test]
    async fn test_empty_result_leaves_store_untouched() {
        let db = Database::in_memory().await.unwrap();
        let count = sync_catalog(&FixedCatalog(vec![]), &db, "", Decimal::from(950))
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(db.changes().revision(crate::db::Table::Products), 0);
    }

    #[tokio::test]
    async fn test_spawned_sync_reports_completion() {
        let db = Database::in_memory().await.unwrap();
        let rx = spawn_sync(
            Arc::new(FixedCatalog(vec![game(1, "Celeste"), game(2, "Hades")])),
            Arc::new(db.clone()),
            String::new(),
            Decimal::from(950),
        );

        assert_eq!(finished(rx).await, SyncStatus::Completed { count: 2 });
        assert_eq!(db.count_products().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_spawned_sync_reports_failure() {
        let db = Database::in_memory().await.unwrap();
        let rx = spawn_sync(
            Arc::new(BrokenCatalog),
            Arc::new(db.clone()),
            String::new(),
            Decimal::from(950),
        );

        let status = finished(rx).await;
        assert!(
            matches!(status, SyncStatus::Failed(ref msg) if msg.contains("service unavailable"))
        );
        assert_eq!(db.count_products().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_spawned_sync_survives_out_of_range_price() {
        let db = Database::in_memory().await.unwrap();
        let huge = RawItem {
            game_info: Some(GameInfo {
                id: Some(1),
                name: Some("Overpriced".to_string()),
                lowest_price: Some(1e27),
                ..GameInfo::default()
            }),
            ..RawItem::default()
        };
        let rx = spawn_sync(
            Arc::new(FixedCatalog(vec![huge])),
            Arc::new(db.clone()),
            String::new(),
            Decimal::from(950),
        );

        assert_eq!(finished(rx).await, SyncStatus::Completed { count: 1 });
        let products = db.products().await.unwrap();
        assert!(products[0].price.is_zero());
    }

    #[tokio::test]
    async fn test_panicking_sync_is_reported_as_failed() {
        let db = Database::in_memory().await.unwrap();
        let rx = spawn_sync(
            Arc::new(PanickingCatalog),
            Arc::new(db.clone()),
            String::new(),
            Decimal::from(950),
        );

        let status = finished(rx).await;
        assert!(
            matches!(status, SyncStatus::Failed(ref msg) if msg.contains("catalog sync task aborted"))
        );
    }
}
