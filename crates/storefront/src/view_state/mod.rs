//! Consolidated catalog view state.
//!
//! [`CatalogAggregator`] merges the product, news and highlight feeds with
//! the profile of whoever is logged in, and republishes a fresh
//! [`ViewState`] whenever any of them moves.

mod aggregator;

pub use aggregator::CatalogAggregator;

use serde::Serialize;

use crate::models::{NewsItem, Product, User};

/// Everything the catalog screens render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub products: Vec<Product>,
    pub news: Vec<NewsItem>,
    /// Home-screen highlights; currently the same rows as `news`.
    pub highlights: Vec<NewsItem>,
    pub user_profile: Option<User>,
    /// True until products, news and highlights have each delivered once.
    pub loading: bool,
    /// Non-fatal banner, e.g. a failed background sync.
    pub error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            news: Vec::new(),
            highlights: Vec::new(),
            user_profile: None,
            loading: true,
            error: None,
        }
    }
}
