//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! gameverse-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GAMEVERSE_DATABASE_URL` - SQLite connection string (falls back to `DATABASE_URL`)
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in the
//! binary, so the command works without the source tree.

use super::{CommandError, open_state};

/// Apply any pending migrations.
///
/// # Errors
///
/// Returns `CommandError` if the configuration is invalid or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    open_state().await?;
    tracing::info!("Storefront migrations complete!");
    Ok(())
}
