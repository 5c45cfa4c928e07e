//! The view-state pipeline.
//!
//! A single task owns every input stream and is the only writer of the
//! published state. Catalog feeds are combined latest-wins; the profile feed
//! is rebuilt from scratch whenever the session identity changes, and the old
//! one is dropped together with any lookup it still had in flight.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gameverse_core::UserId;

use super::ViewState;
use crate::catalog::{CatalogSource, SyncStatus, spawn_sync};
use crate::config::CatalogConfig;
use crate::db::{Store, feeds};
use crate::models::{NewsItem, Product, User};
use crate::session::SessionIdentity;

/// Handle to a running aggregation task.
///
/// Dropping the handle stops the task.
pub struct CatalogAggregator {
    state: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

impl CatalogAggregator {
    /// Start a background catalog sync, then the aggregator that reports on it.
    ///
    /// The sync is not awaited; the view state is served from the local
    /// store straight away and picks up synced products when they land.
    #[must_use]
    pub fn start(
        store: Arc<dyn Store>,
        session: &SessionIdentity,
        catalog: Arc<dyn CatalogSource>,
        config: &CatalogConfig,
    ) -> Self {
        let sync = spawn_sync(
            catalog,
            Arc::clone(&store),
            config.sync_query.clone(),
            config.price_rate,
        );
        Self::spawn(store, session, Some(sync))
    }

    /// Spawn the aggregator over `store` and `session`.
    ///
    /// `sync`, if given, is watched for failures to surface as a banner.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn Store>,
        session: &SessionIdentity,
        sync: Option<watch::Receiver<SyncStatus>>,
    ) -> Self {
        let (tx, state) = watch::channel(ViewState::default());
        let sources = Sources {
            products: feeds::products_feed(Arc::clone(&store)),
            news: feeds::news_feed(Arc::clone(&store)),
            highlights: feeds::news_feed(Arc::clone(&store)),
            identity: session.subscribe(),
            sync,
            store,
        };
        let task = tokio::spawn(run(sources, tx));
        Self { state, task }
    }

    /// The latest published state.
    #[must_use]
    pub fn current(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Receive every published state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.clone()
    }
}

impl Drop for CatalogAggregator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Sources {
    products: BoxStream<'static, Vec<Product>>,
    news: BoxStream<'static, Vec<NewsItem>>,
    highlights: BoxStream<'static, Vec<NewsItem>>,
    identity: watch::Receiver<Option<UserId>>,
    sync: Option<watch::Receiver<SyncStatus>>,
    store: Arc<dyn Store>,
}

/// Latest value seen from each source. `None` means not yet delivered.
#[derive(Default)]
struct Latest {
    products: Option<Vec<Product>>,
    news: Option<Vec<NewsItem>>,
    highlights: Option<Vec<NewsItem>>,
    user_profile: Option<User>,
    error: Option<String>,
}

impl Latest {
    fn view(&self) -> ViewState {
        ViewState {
            products: self.products.clone().unwrap_or_default(),
            news: self.news.clone().unwrap_or_default(),
            highlights: self.highlights.clone().unwrap_or_default(),
            user_profile: self.user_profile.clone(),
            loading: self.products.is_none() || self.news.is_none() || self.highlights.is_none(),
            error: self.error.clone(),
        }
    }

    fn apply_sync(&mut self, status: &SyncStatus) {
        if let SyncStatus::Failed(message) = status {
            self.error = Some(format!("Catalog sync failed: {message}"));
        }
    }
}

/// Profile stream for `id`: the user's live record, or a single `None`.
fn profile_feed(store: &Arc<dyn Store>, id: Option<UserId>) -> BoxStream<'static, Option<User>> {
    match id {
        Some(id) => feeds::user_feed(Arc::clone(store), id),
        None => stream::once(async { None }).boxed(),
    }
}

/// Wait for the next sync status. Never resolves once the sync is gone.
async fn next_sync_status(sync: &mut Option<watch::Receiver<SyncStatus>>) -> Option<SyncStatus> {
    match sync {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

async fn run(mut sources: Sources, tx: watch::Sender<ViewState>) {
    let mut latest = Latest::default();

    if let Some(rx) = sources.sync.as_mut() {
        latest.apply_sync(&rx.borrow_and_update());
    }

    let mut identity_open = true;
    let mut profile = profile_feed(&sources.store, *sources.identity.borrow_and_update());

    info!("View-state aggregator started");

    loop {
        tokio::select! {
            Some(products) = sources.products.next() => {
                latest.products = Some(products);
            }
            Some(news) = sources.news.next() => {
                latest.news = Some(news);
            }
            Some(highlights) = sources.highlights.next() => {
                latest.highlights = Some(highlights);
            }
            Some(user) = profile.next() => {
                latest.user_profile = user;
            }
            changed = sources.identity.changed(), if identity_open => {
                if changed.is_err() {
                    debug!("Session identity closed; profile feed frozen");
                    identity_open = false;
                    continue;
                }
                let id = *sources.identity.borrow_and_update();
                debug!(user_id = ?id, "Switching profile feed");
                // Replacing the stream drops the superseded lookup.
                profile = profile_feed(&sources.store, id);
                latest.user_profile = None;
            }
            status = next_sync_status(&mut sources.sync) => {
                match status {
                    Some(status) => latest.apply_sync(&status),
                    None => sources.sync = None,
                }
            }
            else => {
                warn!("All view-state sources ended");
                break;
            }
        }

        tx.send_replace(latest.view());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use gameverse_core::{Email, Price, ProductId, Username};
    use tokio::sync::Notify;

    use super::*;
    use crate::db::seed::seed_if_empty;
    use crate::db::{ChangeTracker, Database, RepositoryError};
    use crate::models::NewUser;

    async fn wait_until(
        rx: &mut watch::Receiver<ViewState>,
        pred: impl FnMut(&ViewState) -> bool,
    ) -> ViewState {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
            .await
            .expect("timed out waiting for view state")
            .unwrap();
        rx.borrow().clone()
    }

    async fn add_user(db: &Database, name: &str) -> User {
        db.insert_user(&NewUser {
            username: Username::parse(name).unwrap(),
            password_hash: String::new(),
            full_name: name.to_string(),
            email: Email::parse("player@example.com").unwrap(),
            member_since: Utc::now(),
            avatar_url: String::new(),
        })
        .await
        .unwrap()
    }

    fn profile_name(state: &ViewState) -> Option<&str> {
        state.user_profile.as_ref().map(|u| u.username.as_str())
    }

    /// Store whose lookups of one user block until released.
    struct GatedStore {
        inner: Database,
        gated: UserId,
        started: Notify,
        release: Notify,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl Store for GatedStore {
        fn changes(&self) -> &ChangeTracker {
            self.inner.changes()
        }
        async fn products(&self) -> Result<Vec<Product>, RepositoryError> {
            self.inner.products().await
        }
        async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            self.inner.product_by_id(id).await
        }
        async fn news(&self) -> Result<Vec<NewsItem>, RepositoryError> {
            self.inner.news().await
        }
        async fn upsert_products(&self, products: &[Product]) -> Result<(), RepositoryError> {
            self.inner.upsert_products(products).await
        }
        async fn upsert_news(&self, news: &[NewsItem]) -> Result<(), RepositoryError> {
            self.inner.upsert_news(news).await
        }
        async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
            self.inner.update_product(product).await
        }
        async fn count_products(&self) -> Result<i64, RepositoryError> {
            self.inner.count_products().await
        }
        async fn count_news(&self) -> Result<i64, RepositoryError> {
            self.inner.count_news().await
        }
        async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
            self.inner.insert_user(user).await
        }
        async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            if id == self.gated {
                self.started.notify_one();
                self.release.notified().await;
                self.completed.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.user_by_id(id).await
        }
        async fn user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
            self.inner.user_by_username(username).await
        }
        async fn credentials(
            &self,
            username: &str,
        ) -> Result<Option<(User, String)>, RepositoryError> {
            self.inner.credentials(username).await
        }
        async fn update_user(&self, user: &User) -> Result<(), RepositoryError> {
            self.inner.update_user(user).await
        }
    }

    #[tokio::test]
    async fn test_loading_clears_once_every_catalog_source_delivered() {
        let db = Database::in_memory().await.unwrap();
        let session = SessionIdentity::new();
        let aggregator = CatalogAggregator::spawn(Arc::new(db), &session, None);
        assert!(aggregator.current().loading);

        let mut rx = aggregator.subscribe();
        let state = wait_until(&mut rx, |s| !s.loading).await;

        // Empty lists still count as delivered.
        assert!(state.products.is_empty());
        assert!(state.news.is_empty());
        assert!(state.user_profile.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_combines_catalog_feeds() {
        let db = Database::in_memory().await.unwrap();
        seed_if_empty(&db).await.unwrap();
        let session = SessionIdentity::new();
        let aggregator = CatalogAggregator::spawn(Arc::new(db.clone()), &session, None);
        let mut rx = aggregator.subscribe();

        let state = wait_until(&mut rx, |s| !s.loading).await;
        assert_eq!(state.products.len(), 6);
        assert_eq!(state.news.len(), 3);
        assert_eq!(state.highlights, state.news);

        db.upsert_products(&[Product {
            id: ProductId::new(8),
            name: "Capture card".to_string(),
            description: String::new(),
            price: Price::from_str("60000").unwrap(),
            image_url: String::new(),
        }])
        .await
        .unwrap();

        let state = wait_until(&mut rx, |s| s.products.len() == 7).await;
        assert_eq!(state.news.len(), 3);
    }

    #[tokio::test]
    async fn test_profile_follows_identity_and_edits() {
        let db = Database::in_memory().await.unwrap();
        let alice = add_user(&db, "alice").await;
        let bobby = add_user(&db, "bobby").await;
        let session = SessionIdentity::new();
        let aggregator = CatalogAggregator::spawn(Arc::new(db.clone()), &session, None);
        let mut rx = aggregator.subscribe();
        wait_until(&mut rx, |s| !s.loading).await;

        session.set(Some(alice.id));
        wait_until(&mut rx, |s| profile_name(s) == Some("alice")).await;

        let mut edited = alice.clone();
        edited.full_name = "Alice Liddell".to_string();
        db.update_user(&edited).await.unwrap();
        wait_until(&mut rx, |s| {
            s.user_profile.as_ref().map(|u| u.full_name.as_str()) == Some("Alice Liddell")
        })
        .await;

        session.set(Some(bobby.id));
        wait_until(&mut rx, |s| profile_name(s) == Some("bobby")).await;

        session.clear();
        wait_until(&mut rx, |s| s.user_profile.is_none()).await;
    }

    #[tokio::test]
    async fn test_superseded_lookup_never_lands() {
        let db = Database::in_memory().await.unwrap();
        let alice = add_user(&db, "alice").await;
        let bobby = add_user(&db, "bobby").await;
        let store = Arc::new(GatedStore {
            inner: db,
            gated: alice.id,
            started: Notify::new(),
            release: Notify::new(),
            completed: AtomicUsize::new(0),
        });
        let session = SessionIdentity::new();
        let aggregator = CatalogAggregator::spawn(store.clone(), &session, None);
        let mut rx = aggregator.subscribe();
        wait_until(&mut rx, |s| !s.loading).await;

        session.set(Some(alice.id));
        tokio::time::timeout(Duration::from_secs(5), store.started.notified())
            .await
            .unwrap();

        session.set(Some(bobby.id));
        wait_until(&mut rx, |s| profile_name(s) == Some("bobby")).await;

        // Nobody is waiting on the gate any more, so this stores a permit
        // that no lookup consumes.
        store.release.notify_one();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.completed.load(Ordering::SeqCst), 0);
        assert_eq!(profile_name(&aggregator.current()), Some("bobby"));
    }

    #[tokio::test]
    async fn test_sync_failure_is_a_banner() {
        let db = Database::in_memory().await.unwrap();
        seed_if_empty(&db).await.unwrap();
        let session = SessionIdentity::new();
        let (sync_tx, sync_rx) = watch::channel(SyncStatus::Pending);
        let aggregator = CatalogAggregator::spawn(Arc::new(db), &session, Some(sync_rx));
        let mut rx = aggregator.subscribe();
        wait_until(&mut rx, |s| !s.loading).await;

        sync_tx
            .send(SyncStatus::Failed("HTTP error".to_string()))
            .unwrap();
        drop(sync_tx);

        let state = wait_until(&mut rx, |s| s.error.is_some()).await;
        assert_eq!(
            state.error.as_deref(),
            Some("Catalog sync failed: HTTP error")
        );
        assert_eq!(state.products.len(), 6);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_already_failed_sync_is_reported() {
        let db = Database::in_memory().await.unwrap();
        let session = SessionIdentity::new();
        let (_sync_tx, sync_rx) = watch::channel(SyncStatus::Failed("offline".to_string()));
        let aggregator = CatalogAggregator::spawn(Arc::new(db), &session, Some(sync_rx));
        let mut rx = aggregator.subscribe();

        let state = wait_until(&mut rx, |s| !s.loading).await;
        assert_eq!(state.error.as_deref(), Some("Catalog sync failed: offline"));
    }

    #[tokio::test]
    async fn test_drop_stops_the_task() {
        let db = Database::in_memory().await.unwrap();
        let session = SessionIdentity::new();
        let aggregator = CatalogAggregator::spawn(Arc::new(db), &session, None);
        let mut rx = aggregator.subscribe();
        wait_until(&mut rx, |s| !s.loading).await;

        drop(aggregator);
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            while rx.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
    }
}
