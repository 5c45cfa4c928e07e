//! Seed an empty database with the starter catalog.
//!
//! Tables that already hold rows are left alone, so the command is safe to
//! run repeatedly.

use gameverse_storefront::db::seed::seed_if_empty;

use super::{CommandError, open_state};

/// Insert the starter products and news into empty tables.
///
/// # Errors
///
/// Returns `CommandError` if the store cannot be opened or written.
pub async fn run() -> Result<(), CommandError> {
    let state = open_state().await?;
    let report = seed_if_empty(state.database()).await?;

    if report.products == 0 && report.news == 0 {
        tracing::info!("Database already seeded; nothing to do");
    } else {
        tracing::info!(
            products = report.products,
            news = report.news,
            "Seeding complete!"
        );
    }
    Ok(())
}
