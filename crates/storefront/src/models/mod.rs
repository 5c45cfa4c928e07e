//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! types and remote API payloads.

pub mod cart;
pub mod catalog;
pub mod user;

pub use cart::CartLine;
pub use catalog::{NewsItem, Product};
pub use user::{NewUser, User};
