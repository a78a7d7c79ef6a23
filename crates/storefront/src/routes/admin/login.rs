//! Admin sign-in and sign-out.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, push_flash, set_current_user};
use crate::models::Flash;
use crate::routes::layout::PageContext;
use crate::services::AuthService;
use crate::state::AppState;

/// Admin login form data.
#[derive(Deserialize)]
pub struct AdminLoginForm {
    pub email: String,
    pub password: SecretString,
}

/// Admin login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct AdminLoginTemplate {
    pub ctx: PageContext,
}

/// Display the admin login page.
pub async fn login_page(ctx: PageContext) -> Response {
    if ctx.is_admin() {
        return Redirect::to("/admin").into_response();
    }
    AdminLoginTemplate { ctx }.into_response()
}

/// Handle admin login form submission.
///
/// A correct password on an account without the admin flag is refused and
/// its remote session revoked.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Response {
    match AuthService::new(state.supabase())
        .admin_sign_in(&form.email, &form.password)
        .await
    {
        Ok(admin) => {
            if let Err(e) = session.cycle_id().await {
                tracing::warn!("Failed to rotate session id: {e}");
            }
            if let Err(e) = set_current_user(&session, &admin).await {
                tracing::error!("Failed to set admin session: {e}");
                push_flash(&session, Flash::error("Ошибка входа: сессия не создана")).await;
                return Redirect::to("/admin/login").into_response();
            }
            set_sentry_user(&admin.id, Some(admin.email.as_str()));
            tracing::info!(user_id = %admin.id, "Admin signed in");
            Redirect::to("/admin").into_response()
        }
        Err(e) => {
            tracing::warn!("Admin login failed: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/admin/login").into_response()
        }
    }
}

/// Sign out of the admin area.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if let Some(user) = user {
        AuthService::new(state.supabase()).sign_out(&user).await;
    }
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();

    Redirect::to("/admin/login").into_response()
}
