//! One-off catalog sync.
//!
//! Runs the same fetch-and-upsert as the storefront's background sync, but
//! waits for it and fails loudly.

use gameverse_storefront::catalog::sync_catalog;

use super::{CommandError, open_state};

/// Fetch `query` (or the configured sync query) and upsert the results.
///
/// # Errors
///
/// Returns `CommandError` if the fetch or the upsert fails.
pub async fn run(query: Option<String>) -> Result<(), CommandError> {
    let state = open_state().await?;
    let query = query.unwrap_or_else(|| state.config().catalog.sync_query.clone());

    let catalog = state.catalog();
    let written = sync_catalog(
        catalog.as_ref(),
        state.database(),
        &query,
        state.config().catalog.price_rate,
    )
    .await?;

    tracing::info!(query = %query, written, "Catalog sync finished");
    Ok(())
}
