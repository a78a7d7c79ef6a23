//! Session-scoped models for the storefront.

pub mod session;

pub use session::{CurrentUser, Flash, FlashKind, keys as session_keys};
