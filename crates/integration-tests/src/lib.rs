//! Integration tests for AQUA DEKOR.
//!
//! The storefront talks to its hosted backend only over HTTP, so these
//! tests run it against [`FakeBackend`]: an in-process axum server that
//! emulates the PostgREST and GoTrue endpoints the storefront calls and
//! records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p aqua-dekor-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `supabase_client` - Query building, headers and error mapping
//! - `services` - Auth, cart, favorites and catalog services
//! - `storefront_routes` - The full router over HTTP, cookies included

pub mod app;
pub mod backend;
pub mod fixtures;

pub use app::{TestApp, location};
pub use backend::{ANON_KEY, FakeBackend, RecordedRequest};
