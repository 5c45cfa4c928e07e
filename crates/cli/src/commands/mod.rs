//! Subcommand implementations.
//!
//! Every command loads [`StorefrontConfig`] from the environment and opens
//! the store through [`AppState`], so migrations are always applied first.

pub mod migrate;
pub mod products;
pub mod seed;
pub mod sync;
pub mod users;

use gameverse_storefront::config::{ConfigError, StorefrontConfig};
use gameverse_storefront::db::RepositoryError;
use gameverse_storefront::error::AppError;
use gameverse_storefront::state::AppState;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    App(#[from] AppError),

    /// Input was refused by validation; the message lists the reasons.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Failed(String),
}

/// Load configuration and open the store.
async fn open_state() -> Result<AppState, CommandError> {
    let config = StorefrontConfig::from_env()?;
    tracing::info!("Opening database...");
    Ok(AppState::from_config(config).await?)
}
