//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::supabase::SupabaseClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration and the backend
/// client (whose connection pool is shared by every request).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    supabase: SupabaseClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let supabase = SupabaseClient::new(&config.supabase);
        Self {
            inner: Arc::new(AppStateInner { config, supabase }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }
}
