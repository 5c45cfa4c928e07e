//! Live query feeds.
//!
//! Each feed yields the current rows immediately, then again after every
//! committed write to its table. A query that fails is logged and skipped;
//! the feed keeps running and retries on the next change.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

use gameverse_core::UserId;

use super::changes::Table;
use super::store::Store;
use crate::models::{NewsItem, Product, User};

/// All products, ordered by id.
#[must_use]
pub fn products_feed(store: Arc<dyn Store>) -> BoxStream<'static, Vec<Product>> {
    WatchStream::new(store.changes().subscribe(Table::Products))
        .filter_map(move |_| {
            let store = Arc::clone(&store);
            async move {
                store
                    .products()
                    .await
                    .inspect_err(|e| warn!(error = %e, "Products feed query failed"))
                    .ok()
            }
        })
        .boxed()
}

/// All news items, ordered by id.
#[must_use]
pub fn news_feed(store: Arc<dyn Store>) -> BoxStream<'static, Vec<NewsItem>> {
    WatchStream::new(store.changes().subscribe(Table::News))
        .filter_map(move |_| {
            let store = Arc::clone(&store);
            async move {
                store
                    .news()
                    .await
                    .inspect_err(|e| warn!(error = %e, "News feed query failed"))
                    .ok()
            }
        })
        .boxed()
}

/// The user with `id`, or `None` while no such row exists.
#[must_use]
pub fn user_feed(store: Arc<dyn Store>, id: UserId) -> BoxStream<'static, Option<User>> {
    WatchStream::new(store.changes().subscribe(Table::Users))
        .filter_map(move |_| {
            let store = Arc::clone(&store);
            async move {
                store
                    .user_by_id(id)
                    .await
                    .inspect_err(|e| warn!(error = %e, user_id = %id, "User feed query failed"))
                    .ok()
            }
        })
        .boxed()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use chrono::Utc;
    use gameverse_core::{Email, Price, ProductId, Username};

    use super::*;
    use crate::db::Database;
    use crate::models::NewUser;

    async fn next<T>(stream: &mut BoxStream<'static, T>) -> T {
        tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_products_feed_emits_current_then_changes() {
        let db = Database::in_memory().await.unwrap();
        let store: Arc<dyn Store> = Arc::new(db.clone());
        let mut feed = products_feed(Arc::clone(&store));

        assert!(next(&mut feed).await.is_empty());

        store
            .upsert_products(&[Product {
                id: ProductId::new(3),
                name: "Keyboard".to_owned(),
                description: String::new(),
                price: Price::from_str("120000").unwrap(),
                image_url: String::new(),
            }])
            .await
            .unwrap();

        let products = next(&mut feed).await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Keyboard");
    }

    #[tokio::test]
    async fn test_user_feed_tracks_profile_edits() {
        let db = Database::in_memory().await.unwrap();
        let store: Arc<dyn Store> = Arc::new(db);
        let mut user = store
            .insert_user(&NewUser {
                username: Username::parse("gamer").unwrap(),
                password_hash: String::new(),
                full_name: "Gamer".to_owned(),
                email: Email::parse("gamer@example.com").unwrap(),
                member_since: Utc::now(),
                avatar_url: String::new(),
            })
            .await
            .unwrap();

        let mut feed = user_feed(Arc::clone(&store), user.id);
        assert_eq!(next(&mut feed).await.unwrap().full_name, "Gamer");

        user.full_name = "Renamed".to_owned();
        store.update_user(&user).await.unwrap();
        assert_eq!(next(&mut feed).await.unwrap().full_name, "Renamed");
    }

    #[tokio::test]
    async fn test_user_feed_for_missing_user_yields_none() {
        let store: Arc<dyn Store> = Arc::new(Database::in_memory().await.unwrap());
        let mut feed = user_feed(store, UserId::new(42));
        assert!(next(&mut feed).await.is_none());
    }
}
