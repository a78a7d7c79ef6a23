//! Data every full page needs from the request.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::middleware::{CspNonce, OptionalAuth, take_flash};
use crate::models::{CurrentUser, Flash};
use crate::state::AppState;

/// Layout context: CSP nonce, signed-in user and the pending banner.
///
/// Badge counts are not part of it; the header loads them with
/// `hx-get="/cart/count"` and `/favorites/count`.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nonce: String,
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Context for pages rendered outside a handler (error pages).
    #[must_use]
    pub fn bare() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }

    /// Header greeting.
    #[must_use]
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or("", CurrentUser::short_name)
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        let flash = match parts.extensions.get::<Session>() {
            Some(session) => take_flash(session).await,
            None => None,
        };

        Ok(Self { nonce, user, flash })
    }
}
