//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Login, registration and logout
//! - `cart` - In-memory cart
//! - `profile` - Editing the logged-in user's profile
//! - `admin` - Catalog edits for the admin account

pub mod admin;
pub mod auth;
pub mod cart;
pub mod profile;

pub use admin::AdminService;
pub use auth::{AuthCoordinator, AuthOutcome, AuthPhase, AuthState, FieldErrors};
pub use cart::{CartManager, CartState};
pub use profile::{ProfileService, ProfileUpdate};
