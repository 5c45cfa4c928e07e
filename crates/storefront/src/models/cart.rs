//! Cart domain types.

use serde::{Deserialize, Serialize};

use gameverse_core::{Price, ProductId};

use super::Product;

/// A product snapshot taken when it was added to the cart.
///
/// Later edits to the product do not affect lines already in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image_url: String,
}

impl From<&Product> for CartLine {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
        }
    }
}
