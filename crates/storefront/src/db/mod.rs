//! Local relational cache backed by SQLite.
//!
//! # Tables
//!
//! - `products` - Catalog cache, filled by the first-run seed and the remote sync
//! - `news` - News articles, also used as home-screen highlights
//! - `users` - Registered shop accounts
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/`, embedded at build
//! time and applied by [`Database::connect`] or explicitly via:
//! ```bash
//! cargo run -p gameverse-cli -- migrate
//! ```
//!
//! # Change notification
//!
//! Every successful write bumps a per-table revision in [`ChangeTracker`].
//! The live feeds in [`feeds`] re-query whenever the revision moves.

pub mod changes;
pub mod feeds;
pub mod news;
pub mod products;
pub mod seed;
pub mod store;
pub mod users;

use std::str::FromStr;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use changes::{ChangeTracker, Table};
pub use store::{Database, Store};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a SQLite connection pool.
///
/// The database file is created if it does not exist.
///
/// # Arguments
///
/// * `database_url` - SQLite connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be opened.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options =
        SqliteConnectOptions::from_str(database_url.expose_secret())?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Create a pool over a private in-memory database.
///
/// A single connection that is never recycled, so every query sees the same
/// database for the lifetime of the pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if SQLite cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Apply the embedded migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails to apply.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Map a sqlx error, translating unique violations into `Conflict`.
fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
