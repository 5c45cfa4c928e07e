//! Mapping from search hits to local products.

use rust_decimal::Decimal;
use tracing::debug;

use gameverse_core::{Price, ProductId};

use super::types::RawItem;
use crate::models::Product;

/// Name used when a hit carries neither a game name nor a title.
pub const UNTITLED_PRODUCT: &str = "Untitled product";

/// Description used when a hit carries no text at all.
pub const NO_DESCRIPTION: &str = "No description";

/// Default USD to CLP conversion rate.
pub const DEFAULT_PRICE_RATE: Decimal = Decimal::from_parts(950, 0, 0, false, 0);

/// Convert a search hit into a product.
///
/// Returns `None` for hits without a game id, since the id is the upsert key.
/// The USD price is multiplied by `rate` and rounded to cents; a missing,
/// non-finite, negative or overflowing price becomes zero.
#[must_use]
pub fn convert_item(item: &RawItem, rate: Decimal) -> Option<Product> {
    let info = item.game_info.as_ref();

    let Some(id) = info.and_then(|i| i.id) else {
        debug!(title = ?item.title, "Skipping catalog item without game id");
        return None;
    };

    let name = info
        .and_then(|i| i.name.clone())
        .or_else(|| item.title.clone())
        .unwrap_or_else(|| UNTITLED_PRODUCT.to_owned());

    let description = info
        .and_then(|i| i.short_desc.clone())
        .or_else(|| item.text.clone())
        .unwrap_or_else(|| NO_DESCRIPTION.to_owned());

    let usd = info
        .and_then(|i| i.lowest_price)
        .and_then(|p| Decimal::try_from(p).ok())
        .unwrap_or(Decimal::ZERO);

    let price = usd
        .checked_mul(rate)
        .and_then(|amount| Price::new(amount.round_dp(2)).ok())
        .unwrap_or_else(|| {
            if !usd.is_zero() {
                debug!(id, %usd, "Catalog price out of range; using zero");
            }
            Price::ZERO
        });

    Some(Product {
        id: ProductId::new(id),
        name,
        description,
        price,
        image_url: item.image.clone().unwrap_or_default(),
    })
}

/// Convert every hit that has a game id.
#[must_use]
pub fn convert_items(items: &[RawItem], rate: Decimal) -> Vec<Product> {
    items
        .iter()
        .filter_map(|item| convert_item(item, rate))
        .collect()
}
