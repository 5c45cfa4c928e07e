//! Profile editing for the logged-in user.

use std::sync::Arc;

use tracing::{info, instrument};

use gameverse_core::Email;

use crate::db::{RepositoryError, Store};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::session::SessionIdentity;

/// Fields to change; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Reads and edits the profile of whoever is logged in.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
    session: SessionIdentity,
}

impl ProfileService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, session: SessionIdentity) -> Self {
        Self { store, session }
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if nobody is logged in and
    /// `AppError::NotFound` if the session points at a missing user.
    pub async fn current(&self) -> Result<User> {
        let id = self
            .session
            .get()
            .ok_or_else(|| AppError::Unauthorized("log in to view your profile".to_string()))?;

        self.store
            .user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))
    }

    /// Apply `update` to the logged-in user and return the stored result.
    ///
    /// The aggregator's profile feed picks the change up on its own.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if nobody is logged in,
    /// `AppError::BadRequest` for an empty name or malformed email, and
    /// `AppError::Database` if the write fails.
    #[instrument(skip(self, update))]
    pub async fn update(&self, update: ProfileUpdate) -> Result<User> {
        let mut user = self.current().await?;

        if let Some(full_name) = update.full_name {
            let full_name = full_name.trim();
            if full_name.is_empty() {
                return Err(AppError::BadRequest("full name cannot be empty".to_string()));
            }
            full_name.clone_into(&mut user.full_name);
        }
        if let Some(email) = update.email {
            user.email = Email::parse(&email)?;
        }
        if let Some(avatar_url) = update.avatar_url {
            user.avatar_url = avatar_url;
        }

        self.store.update_user(&user).await.map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("user {}", user.id)),
            other => AppError::Database(other),
        })?;

        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}
