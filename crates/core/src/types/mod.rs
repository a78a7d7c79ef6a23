//! Core types for AQUA DEKOR.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod rating;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use rating::{Rating, RatingError, StarFill, format_rating, star_fills};
pub use status::{OrderStatus, OrderStatusError};
