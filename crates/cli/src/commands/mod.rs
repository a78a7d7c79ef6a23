//! CLI command implementations.

pub mod admin;
pub mod seed;

use aqua_dekor_storefront::config::{ConfigError, SupabaseConfig};
use aqua_dekor_storefront::supabase::SupabaseClient;

/// Environment variable holding the service-role key.
pub const SERVICE_ROLE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Backend client authenticated with the service-role key.
///
/// # Errors
///
/// Returns `ConfigError` if `SUPABASE_URL` or the key is missing.
pub fn service_client() -> Result<SupabaseClient, ConfigError> {
    let config = SupabaseConfig::from_env(SERVICE_ROLE_KEY_VAR)?;
    Ok(SupabaseClient::new(&config))
}
