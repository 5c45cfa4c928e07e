//! Catalog domain types.

use serde::{Deserialize, Serialize};

use gameverse_core::{NewsId, Price, ProductId};

/// A product that can be sold in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable product ID (shared with the remote catalog).
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Image URL, empty when the product has no picture.
    pub image_url: String,
}

/// A news article or home-screen highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: NewsId,
    pub title: String,
    pub summary: String,
    pub image_url: String,
}
