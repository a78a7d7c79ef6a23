//! Session middleware configuration.
//!
//! Sessions live in process memory; the cookie carries only the signed
//! session id. Everything else (tokens, banner messages) stays server-side.

use secrecy::ExposeSecret;
use thiserror::Error;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;
use crate::models::{Flash, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ad_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The session layer type used by the router.
pub type StorefrontSessionLayer = SessionManagerLayer<MemoryStore, SignedCookie>;

/// Errors building the session layer.
#[derive(Debug, Error)]
pub enum SessionSetupError {
    #[error("Session secret cannot be used as a signing key: {0}")]
    InvalidKey(String),
}

/// Create the session layer with an in-memory store and signed cookies.
///
/// # Errors
///
/// Returns `SessionSetupError::InvalidKey` if the session secret is shorter
/// than the 64 bytes a signing key needs.
pub fn create_session_layer(
    config: &StorefrontConfig,
) -> Result<StorefrontSessionLayer, SessionSetupError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())
        .map_err(|e| SessionSetupError::InvalidKey(e.to_string()))?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

/// Queue a banner message for the next rendered page.
pub async fn push_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::error!("Failed to store flash message: {e}");
    }
}

/// Take the pending banner message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_flash_is_taken_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        push_flash(&session, Flash::success("Товар добавлен в корзину")).await;

        let flash = take_flash(&session).await.unwrap();
        assert_eq!(flash.message, "Товар добавлен в корзину");
        assert!(take_flash(&session).await.is_none());
    }
}
