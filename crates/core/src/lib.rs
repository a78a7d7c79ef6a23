//! AQUA DEKOR Core - Shared domain types and list logic.
//!
//! This crate provides the types and pure operations used by the other
//! AQUA DEKOR components:
//! - `storefront` - Public storefront and admin area (axum + askama)
//! - `cli` - Operator commands (seeding, admin grants)
//!
//! # Architecture
//!
//! The core crate contains only types and in-memory logic - no I/O, no HTTP
//! clients. Remote records are fetched by the storefront and handed to the
//! functions here for filtering, sorting and cart/favorites bookkeeping.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, ratings and statuses
//! - [`catalog`] - Product/category records, category filter, sort orders, best sellers
//! - [`cart`] - Cart lines and the write each cart action implies
//! - [`favorites`] - Favorites list and toggle planning

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod types;

pub use types::*;
