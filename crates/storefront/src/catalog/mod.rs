//! Remote game catalog.
//!
//! # Architecture
//!
//! - [`CatalogClient`] calls the public game-search API over `reqwest`
//! - Results are mapped into local [`Product`](crate::models::Product)s in
//!   [`conversions`]
//! - [`sync`] upserts mapped products into the local store in the background
//!
//! The local store stays the source of truth for the rest of the crate; the
//! remote API is only read during a sync.

mod client;
pub mod conversions;
pub mod sync;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::CatalogClient;
pub use sync::{SyncStatus, spawn_sync, sync_catalog};
pub use types::RawItem;

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered with `success: false`.
    #[error("catalog API error: {0}")]
    Api(String),

    /// The configured endpoint cannot be joined with a request path.
    #[error("invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A searchable source of remote catalog items.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Search for games matching `query`. An empty query lists the default
    /// result page.
    async fn search(&self, query: &str) -> Result<Vec<RawItem>, CatalogError>;
}
