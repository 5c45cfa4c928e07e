//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for service operations. Faults on our
//! side are reported to Sentry with [`AppError::capture`]; caller mistakes
//! (missing session, missing rights, unknown ids) are not.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::location::GeocodeError;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Remote catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Reverse geocoding failed.
    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No user is logged in.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The logged-in user lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid input from the caller.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is a fault on our side rather than a caller mistake.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Catalog(_)
                | Self::Geocode(_)
                | Self::Config(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        )
    }

    /// Report server faults to Sentry. Caller mistakes are ignored.
    pub fn capture(&self) {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        }
    }
}

impl From<gameverse_core::PriceError> for AppError {
    fn from(err: gameverse_core::PriceError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<gameverse_core::EmailError> for AppError {
    fn from(err: gameverse_core::EmailError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
