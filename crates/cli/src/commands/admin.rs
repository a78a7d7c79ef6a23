//! Admin account management commands.
//!
//! Accounts are created through the storefront's registration form; these
//! commands only flip `profiles.is_admin` using the service-role key.
//!
//! # Usage
//!
//! ```bash
//! ad-cli admin grant -e admin@example.com
//! ad-cli admin revoke -e admin@example.com
//! ad-cli admin list
//! ```

use thiserror::Error;

use aqua_dekor_core::Email;
use aqua_dekor_storefront::config::ConfigError;
use aqua_dekor_storefront::services::AdminService;
use aqua_dekor_storefront::supabase::SupabaseError;
use aqua_dekor_storefront::supabase::types::Profile;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Backend URL or service-role key missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] SupabaseError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No profile with that email.
    #[error("No account registered with email: {0}")]
    UnknownUser(String),
}

/// Grant (`is_admin = true`) or revoke admin access for the account with
/// `email`.
///
/// # Errors
///
/// Returns `AdminError` if the email is invalid, no account uses it, or a
/// backend call fails.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let client = super::service_client()?;
    let admin = AdminService::new(&client, None);

    let profile = admin
        .user_by_email(email.as_str())
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_string()))?;

    if profile.is_admin == is_admin {
        tracing::info!(
            "{} already {}",
            email,
            if is_admin { "is an admin" } else { "is not an admin" }
        );
        return Ok(());
    }

    admin.set_admin(profile.id, is_admin).await?;

    if is_admin {
        tracing::info!("Admin access granted to {email} ({})", profile.id);
        tracing::info!("They can now sign in at /admin/login");
    } else {
        tracing::info!("Admin access revoked from {email} ({})", profile.id);
        tracing::info!("Existing sessions keep the flag until they sign out");
    }
    Ok(())
}

/// Log every account with admin access.
///
/// # Errors
///
/// Returns `AdminError` if the backend cannot be reached.
pub async fn list() -> Result<(), AdminError> {
    let client = super::service_client()?;
    let admins = admins(AdminService::new(&client, None).users().await?);

    if admins.is_empty() {
        tracing::info!("No admin accounts");
        return Ok(());
    }

    tracing::info!("Admin accounts ({}):", admins.len());
    for profile in admins {
        tracing::info!(
            "  {} <{}>",
            profile.shown_name(),
            profile.email.as_deref().unwrap_or("no email")
        );
    }
    Ok(())
}

fn admins(users: Vec<Profile>) -> Vec<Profile> {
    users.into_iter().filter(|p| p.is_admin).collect()
}
