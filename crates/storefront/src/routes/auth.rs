//! Authentication route handlers.
//!
//! Handles login, registration, logout and the email-confirmation callback
//! against the hosted auth API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, push_flash, set_current_user};
use crate::models::{CurrentUser, Flash};
use crate::routes::layout::PageContext;
use crate::services::AuthService;
use crate::services::auth::{CALLBACK_PATH, Registered, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<RegisterForm> for Registration {
    fn from(form: RegisterForm) -> Self {
        Self {
            email: form.email,
            password: form.password,
            password_confirm: form.password_confirm,
            first_name: form.first_name,
            last_name: form.last_name,
        }
    }
}

/// Query parameters of the confirmation link.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
}

/// "Check your email" and confirmation result page.
#[derive(Template, WebTemplate)]
#[template(path = "auth/confirm_email.html")]
pub struct ConfirmEmailTemplate {
    pub ctx: PageContext,
    /// Address the link was sent to, right after registration.
    pub sent_to: Option<String>,
    pub confirmed: bool,
    pub error: Option<String>,
}

/// Store the signed-in user, rotating the session id.
async fn sign_in_session(session: &Session, user: &CurrentUser) -> bool {
    if let Err(e) = session.cycle_id().await {
        tracing::warn!("Failed to rotate session id: {e}");
    }
    match set_current_user(session, user).await {
        Ok(()) => {
            set_sentry_user(&user.id, Some(user.email.as_str()));
            true
        }
        Err(e) => {
            tracing::error!("Failed to set session: {e}");
            false
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(ctx: PageContext) -> Response {
    if ctx.is_signed_in() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate { ctx }.into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match AuthService::new(state.supabase())
        .sign_in(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            if !sign_in_session(&session, &user).await {
                push_flash(&session, Flash::error("Ошибка входа: сессия не создана")).await;
                return Redirect::to("/auth/login").into_response();
            }
            tracing::info!(user_id = %user.id, "User signed in");
            push_flash(&session, Flash::success("Вы вошли в аккаунт")).await;
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/auth/login").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext) -> Response {
    if ctx.is_signed_in() {
        return Redirect::to("/").into_response();
    }
    RegisterTemplate { ctx }.into_response()
}

/// Handle registration form submission.
///
/// Depending on the project's settings the account is signed in right away
/// or a confirmation link is emailed first.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<RegisterForm>,
) -> Response {
    let redirect_to = state.config().absolute_url(CALLBACK_PATH);
    let registration = Registration::from(form);

    match AuthService::new(state.supabase())
        .sign_up(&registration, &redirect_to)
        .await
    {
        Ok(Registered::SignedIn(user)) => {
            sign_in_session(&session, &user).await;
            tracing::info!(user_id = %user.id, "User registered");
            push_flash(&session, Flash::success("Регистрация прошла успешно")).await;
            Redirect::to("/").into_response()
        }
        Ok(Registered::ConfirmationSent(email)) => ConfirmEmailTemplate {
            ctx,
            sent_to: Some(email.into_inner()),
            confirmed: false,
            error: None,
        }
        .into_response(),
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            push_flash(&session, Flash::error(e.user_message())).await;
            Redirect::to("/auth/register").into_response()
        }
    }
}

/// Landing page of the confirmation email link.
///
/// A valid link marks the email as verified and signs the user in.
#[instrument(skip(state, session, ctx, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Query(query): Query<CallbackQuery>,
) -> impl IntoResponse {
    let result = AuthService::new(state.supabase())
        .confirm_email(query.token_hash.as_deref(), query.kind.as_deref())
        .await;

    let (confirmed, error) = match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Email confirmed");
            sign_in_session(&session, &user).await;
            (true, None)
        }
        Err(e) => {
            tracing::warn!("Email confirmation failed: {e}");
            (false, Some(e.user_message()))
        }
    };

    ConfirmEmailTemplate {
        ctx,
        sent_to: None,
        confirmed,
        error,
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out locally and revoke the session remotely.
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

    Redirect::to("/").into_response()
}
