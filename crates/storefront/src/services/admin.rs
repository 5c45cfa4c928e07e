//! Catalog administration.
//!
//! Listing is open to any caller; edits require the logged-in user to hold
//! the admin role.

use std::sync::Arc;

use futures::stream::BoxStream;
use gameverse_core::ProductId;
use tracing::{info, instrument, warn};

use crate::db::{RepositoryError, Store, feeds};
use crate::error::{AppError, Result};
use crate::models::{Product, User};
use crate::session::SessionIdentity;

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn Store>,
    session: SessionIdentity,
}

impl AdminService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, session: SessionIdentity) -> Self {
        Self { store, session }
    }

    /// All local products.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.store.products().await?)
    }

    /// One local product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no product has `id`.
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.store
            .product_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    /// Local products, re-emitted after every change.
    #[must_use]
    pub fn products_feed(&self) -> BoxStream<'static, Vec<Product>> {
        feeds::products_feed(Arc::clone(&self.store))
    }

    /// Overwrite a product's name, description, price and image.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if nobody is logged in,
    /// `AppError::Forbidden` if the user is not an admin and
    /// `AppError::NotFound` if the product does not exist.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn update_product(&self, product: &Product) -> Result<()> {
        let admin = self.require_admin().await?;

        self.store
            .update_product(product)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AppError::NotFound(format!("product {}", product.id)),
                other => AppError::Database(other),
            })?;

        info!(admin_id = %admin.id, "Product updated");
        Ok(())
    }

    async fn require_admin(&self) -> Result<User> {
        let id = self
            .session
            .get()
            .ok_or_else(|| AppError::Unauthorized("log in as an administrator".to_string()))?;

        let user = self
            .store
            .user_by_id(id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("session user no longer exists".to_string()))?;

        if !user.is_admin() {
            warn!(user_id = %id, "Non-admin attempted a catalog edit");
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(user)
    }
}
