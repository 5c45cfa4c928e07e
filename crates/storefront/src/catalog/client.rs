//! HTTP client for the game-search API.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use super::types::{RawItem, SearchResponse};
use super::{CatalogError, CatalogSource};
use crate::config::CatalogConfig;

/// Client for the remote game-search API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        Self::with_base_url(config.api_url.clone())
    }

    /// Create a client against an explicit base URL.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url,
            }),
        }
    }

    /// Build the search URL for `query`.
    fn search_url(&self, query: &str) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.join("search")?;
        url.query_pairs_mut()
            .append_pair("type", "games")
            .append_pair("q", query);
        Ok(url)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    #[instrument(skip(self), fields(query = %query))]
    async fn search(&self, query: &str) -> Result<Vec<RawItem>, CatalogError> {
        let url = self.search_url(query)?;

        let response = self
            .inner
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Api(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: SearchResponse = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse catalog response"
                );
                return Err(CatalogError::Parse(e));
            }
        };

        if !response.success {
            return Err(CatalogError::Api(
                response
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }

        let items = response.into_items();
        debug!(count = items.len(), "Catalog search returned items");
        Ok(items)
    }
}
