//! GameVerse storefront library.
//!
//! This crate provides the shop core as a library: the local store, the
//! remote catalog sync, authentication, the cart and the reactive catalog
//! view state. Front ends drive it through [`state::AppState`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod location;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod view_state;
