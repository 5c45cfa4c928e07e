//! In-memory shopping cart.
//!
//! The cart is never persisted. Every mutation is a single read-modify-write
//! on a watch channel, so observers see each state exactly once and the total
//! always matches the lines.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use gameverse_core::{Price, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{CartLine, Product};

/// Snapshot of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub items: Vec<CartLine>,
    /// Sum of `items` prices.
    pub total: Price,
    /// Set by checkout until the caller acknowledges it.
    pub payment_success: bool,
}

impl CartState {
    fn recompute_total(&mut self) {
        self.total = self.items.iter().map(|line| line.price).sum();
    }
}

/// Owner of the cart state.
#[derive(Debug, Clone)]
pub struct CartManager {
    state: Arc<watch::Sender<CartState>>,
}

impl CartManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(CartState::default())),
        }
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Append a snapshot of `product`. Adding the same product twice gives
    /// two lines.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the new total would overflow; the
    /// cart is left unchanged and nobody is notified.
    pub fn add_item(&self, product: &Product) -> Result<()> {
        let line = CartLine::from(product);
        let id = line.id.to_string();
        let added = self.state.send_if_modified(|s| {
            let Some(total) = s.total.checked_add(line.price) else {
                return false;
            };
            s.items.push(line);
            s.total = total;
            true
        });
        if !added {
            warn!(product_id = %id, "Cart total would overflow");
            return Err(AppError::BadRequest("cart total would overflow".to_string()));
        }
        debug!(product_id = %id, "Added to cart");
        add_breadcrumb("cart", "Added item", Some(&[("product_id", id.as_str())]));
        Ok(())
    }

    /// Remove every line for `product_id`. Unknown ids leave the cart
    /// unchanged and notify nobody.
    pub fn remove_item(&self, product_id: ProductId) {
        let removed = self.state.send_if_modified(|s| {
            let before = s.items.len();
            s.items.retain(|line| line.id != product_id);
            if s.items.len() == before {
                return false;
            }
            s.recompute_total();
            true
        });
        if removed {
            let id = product_id.to_string();
            debug!(product_id = %id, "Removed from cart");
            add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.as_str())]));
        }
    }

    /// Empty the cart and flag the payment as successful, in one step.
    pub fn checkout(&self) {
        let previous = self.state.send_replace(CartState {
            items: Vec::new(),
            total: Price::ZERO,
            payment_success: true,
        });
        info!(
            lines = previous.items.len(),
            total = %previous.total,
            "Checkout completed"
        );
        add_breadcrumb("cart", "Checkout", None);
    }

    /// Acknowledge a completed payment. Idempotent.
    pub fn reset_payment_status(&self) {
        self.state.send_if_modified(|s| {
            let was_set = s.payment_success;
            s.payment_success = false;
            was_set
        });
    }
}

impl Default for CartManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn product(id: i32, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_str(price).unwrap(),
            image_url: format!("https://example.com/{id}.jpg"),
        }
    }

    fn assert_total_matches(cart: &CartManager) {
        let state = cart.state();
        let sum: Price = state.items.iter().map(|l| l.price).sum();
        assert_eq!(state.total, sum);
    }

    #[test]
    fn test_total_tracks_adds_and_removes() {
        let cart = CartManager::new();
        let x = product(1, "100");
        let y = product(2, "50");

        cart.add_item(&x).unwrap();
        assert_total_matches(&cart);
        cart.add_item(&y).unwrap();
        assert_total_matches(&cart);
        assert_eq!(cart.state().total, Price::from_str("150").unwrap());

        cart.remove_item(x.id);
        assert_total_matches(&cart);
        assert_eq!(cart.state().total, Price::from_str("50").unwrap());
    }

    #[test]
    fn test_same_product_twice_is_two_lines() {
        let cart = CartManager::new();
        let x = product(1, "100");

        cart.add_item(&x).unwrap();
        cart.add_item(&x).unwrap();
        assert_eq!(cart.state().items.len(), 2);
        assert_eq!(cart.state().total, Price::from_str("200").unwrap());

        cart.remove_item(x.id);
        assert!(cart.state().items.is_empty());
        assert_eq!(cart.state().total, Price::ZERO);
    }

    #[test]
    fn test_line_is_a_snapshot() {
        let cart = CartManager::new();
        let mut x = product(1, "100");
        cart.add_item(&x).unwrap();

        x.price = Price::from_str("999").unwrap();
        x.name = "Renamed".to_string();

        let state = cart.state();
        let line = &state.items[0];
        assert_eq!(line.price, Price::from_str("100").unwrap());
        assert_eq!(line.name, "Product 1");
        assert_eq!(line.image_url, "https://example.com/1.jpg");
    }

    #[test]
    fn test_removing_unknown_id_does_not_notify() {
        let cart = CartManager::new();
        cart.add_item(&product(1, "100")).unwrap();
        let rx = cart.subscribe();

        cart.remove_item(ProductId::new(99));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(cart.state().items.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_is_one_transition() {
        let cart = CartManager::new();
        cart.add_item(&product(1, "100")).unwrap();
        cart.add_item(&product(2, "50")).unwrap();
        let mut rx = cart.subscribe();

        cart.checkout();

        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(
            seen,
            CartState {
                items: vec![],
                total: Price::ZERO,
                payment_success: true,
            }
        );
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_reset_payment_status_is_idempotent() {
        let cart = CartManager::new();
        cart.checkout();

        cart.reset_payment_status();
        assert!(!cart.state().payment_success);

        let rx = cart.subscribe();
        cart.reset_payment_status();
        assert!(!cart.state().payment_success);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_shopping_scenario() {
        let cart = CartManager::new();
        let x = product(1, "100");
        let y = product(2, "50");

        cart.add_item(&x).unwrap();
        cart.add_item(&y).unwrap();
        cart.add_item(&x).unwrap();
        assert_eq!(cart.state().items.len(), 3);
        assert_eq!(cart.state().total, Price::from_str("250").unwrap());

        cart.remove_item(x.id);
        let state = cart.state();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].id, y.id);
        assert_eq!(state.total, Price::from_str("50").unwrap());

        cart.checkout();
        let state = cart.state();
        assert!(state.items.is_empty());
        assert_eq!(state.total, Price::ZERO);
        assert!(state.payment_success);

        cart.reset_payment_status();
        assert!(!cart.state().payment_success);
    }

    #[test]
    fn test_overflowing_add_is_rejected() {
        let cart = CartManager::new();
        let max = product(1, "79228162514264337593543950335");
        cart.add_item(&max).unwrap();
        let rx = cart.subscribe();

        let err = cart.add_item(&max).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(!rx.has_changed().unwrap());

        let state = cart.state();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.total, max.price);
        assert_total_matches(&cart);
    }
}
