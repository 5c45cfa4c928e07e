//! The data-store seam used by services and the view-state aggregator.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use gameverse_core::{ProductId, UserId};

use super::changes::{ChangeTracker, Table};
use super::news::NewsRepository;
use super::products::ProductRepository;
use super::users::UserRepository;
use super::{RepositoryError, create_memory_pool, create_pool, run_migrations};
use crate::models::{NewUser, NewsItem, Product, User};

/// Storage operations consumed by the rest of the crate.
///
/// Implementations must call [`ChangeTracker::touch`] after every committed
/// write so live feeds re-query.
#[async_trait]
pub trait Store: Send + Sync {
    /// Change revisions for live feeds.
    fn changes(&self) -> &ChangeTracker;

    async fn products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn news(&self) -> Result<Vec<NewsItem>, RepositoryError>;

    async fn upsert_products(&self, products: &[Product]) -> Result<(), RepositoryError>;

    async fn upsert_news(&self, news: &[NewsItem]) -> Result<(), RepositoryError>;

    /// Overwrite an existing product (admin edit).
    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError>;

    async fn count_products(&self) -> Result<i64, RepositoryError>;

    async fn count_news(&self) -> Result<i64, RepositoryError>;

    /// Insert a user; fails with `Conflict` if the username is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// A user and their stored password hash.
    async fn credentials(&self, username: &str)
    -> Result<Option<(User, String)>, RepositoryError>;

    /// Persist profile edits of an existing user.
    async fn update_user(&self, user: &User) -> Result<(), RepositoryError>;
}

/// SQLite-backed [`Store`].
///
/// Cheaply cloneable; clones share the pool and the change tracker.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    changes: Arc<ChangeTracker>,
}

impl Database {
    /// Wrap an existing pool. Migrations are not run.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            changes: Arc::new(ChangeTracker::new()),
        }
    }

    /// Open the database at `database_url` and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database cannot be opened or migrated.
    pub async fn connect(database_url: &SecretString) -> Result<Self, RepositoryError> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Open a migrated, private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if SQLite cannot be opened or migrated.
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        let pool = create_memory_pool().await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for Database {
    fn changes(&self) -> &ChangeTracker {
        &self.changes
    }

    async fn products(&self) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).list().await
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }

    async fn news(&self) -> Result<Vec<NewsItem>, RepositoryError> {
        NewsRepository::new(&self.pool).list().await
    }

    #[instrument(skip_all, fields(count = products.len()))]
    async fn upsert_products(&self, products: &[Product]) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool)
            .upsert_all(products)
            .await?;
        debug!("Products upserted");
        self.changes.touch(Table::Products);
        Ok(())
    }

    #[instrument(skip_all, fields(count = news.len()))]
    async fn upsert_news(&self, news: &[NewsItem]) -> Result<(), RepositoryError> {
        NewsRepository::new(&self.pool).upsert_all(news).await?;
        debug!("News upserted");
        self.changes.touch(Table::News);
        Ok(())
    }

    #[instrument(skip_all, fields(product_id = %product.id))]
    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool).update(product).await?;
        self.changes.touch(Table::Products);
        Ok(())
    }

    async fn count_products(&self) -> Result<i64, RepositoryError> {
        ProductRepository::new(&self.pool).count().await
    }

    async fn count_news(&self) -> Result<i64, RepositoryError> {
        NewsRepository::new(&self.pool).count().await
    }

    #[instrument(skip_all, fields(username = %user.username))]
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let created = UserRepository::new(&self.pool).create(user).await?;
        self.changes.touch(Table::Users);
        Ok(created)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_by_username(username)
            .await
    }

    async fn credentials(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_password_hash(username)
            .await
    }

    #[instrument(skip_all, fields(user_id = %user.id))]
    async fn update_user(&self, user: &User) -> Result<(), RepositoryError> {
        UserRepository::new(&self.pool).update_profile(user).await?;
        self.changes.touch(Table::Users);
        Ok(())
    }
}
