//! GameVerse Core - Shared types library.
//!
//! This crate provides common types used across all GameVerse components:
//! - `storefront` - Catalog, cart, authentication and view-state aggregation
//! - `cli` - Command-line tools for migrations, seeding and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails and usernames

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
