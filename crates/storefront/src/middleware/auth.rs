//! Authentication extractors.
//!
//! The signed-in user lives in the session. Extracting it also refreshes the
//! access token when it is about to expire, so handlers can hand the token
//! straight to the backend.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;

use crate::models::{CurrentUser, Flash, session_keys};
use crate::routes::fragments::banner_response;
use crate::services::AuthService;
use crate::state::AppState;

/// Banner text for actions that need an account.
pub const SIGN_IN_REQUIRED: &str = "Необходимо войти в аккаунт";

/// Extractor that requires a signed-in user.
///
/// Full-page requests are redirected to the login page; HTMX requests get
/// the sign-in banner instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Здравствуйте, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a signed-in administrator.
///
/// The admin flag is read from the profile on every request, so a revoked
/// flag takes effect immediately.
pub struct RequireAdmin(pub CurrentUser);

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<CurrentUser>);

/// Error returned when an extractor's requirement is not met.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to a login page (for full-page requests).
    RedirectTo(&'static str),
    /// Show the sign-in banner (for HTMX requests).
    Banner,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectTo(path) => Redirect::to(path).into_response(),
            Self::Banner => banner_response(&Flash::error(SIGN_IN_REQUIRED)),
        }
    }
}

fn is_htmx(parts: &Parts) -> bool {
    parts.headers.contains_key("hx-request")
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match load_user(parts, state).await {
            Some(user) => Ok(Self(user)),
            None if is_htmx(parts) => Err(AuthRejection::Banner),
            None => Err(AuthRejection::RedirectTo("/auth/login")),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(mut user) = load_user(parts, state).await else {
            return Err(AuthRejection::RedirectTo("/admin/login"));
        };

        let is_admin = match AuthService::new(state.supabase())
            .is_admin(user.id, &user.access_token)
            .await
        {
            Ok(flag) => flag,
            Err(e) => {
                tracing::error!(user_id = %user.id, "Admin check failed: {e}");
                false
            }
        };

        if is_admin != user.is_admin {
            user.is_admin = is_admin;
            if let Some(session) = parts.extensions.get::<Session>() {
                if let Err(e) = set_current_user(session, &user).await {
                    tracing::error!("Failed to store admin flag: {e}");
                }
            }
        }

        if is_admin {
            Ok(Self(user))
        } else {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin hit admin route");
            Err(AuthRejection::RedirectTo("/admin/login"))
        }
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(load_user(parts, state).await))
    }
}

/// Read the user from the session, refreshing tokens close to expiry.
///
/// A failed refresh signs the user out locally.
async fn load_user(parts: &Parts, state: &AppState) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    let mut user = current_user(session).await?;

    let now = Utc::now();
    if user.needs_refresh(now.timestamp()) {
        match state.supabase().refresh_session(&user.refresh_token).await {
            Ok(fresh) => {
                user.apply_refresh(&fresh, now);
                if let Err(e) = set_current_user(session, &user).await {
                    tracing::error!("Failed to store refreshed session: {e}");
                }
            }
            Err(e) => {
                tracing::info!(user_id = %user.id, "Token refresh failed, signing out: {e}");
                if let Err(e) = clear_current_user(session).await {
                    tracing::error!("Failed to clear session: {e}");
                }
                return None;
            }
        }
    }

    Some(user)
}

/// Get the current user from the session without refreshing.
pub async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
