//! Profile page: display name and avatar.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::Flash;
use crate::routes::layout::PageContext;
use crate::services::ProfileService;
use crate::services::profile::ProfileForm;
use crate::state::AppState;
use crate::supabase::types::Profile;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateForm {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub profile: Profile,
}

/// Display the signed-in user's profile.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<ProfileTemplate, AppError> {
    let profile = ProfileService::new(state.supabase(), &user).load().await?;
    Ok(ProfileTemplate { ctx, profile })
}

/// Save display name and avatar URL.
#[instrument(skip_all)]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileUpdateForm>,
) -> Response {
    let flash = match ProfileForm::parse(&form.display_name, &form.avatar_url) {
        Err(message) => Flash::error(message),
        Ok(profile) => match ProfileService::new(state.supabase(), &user)
            .update(profile)
            .await
        {
            Ok(()) => Flash::success("Профиль обновлён"),
            Err(e) => {
                tracing::error!("Failed to update profile: {e}");
                Flash::error(e.user_message())
            }
        },
    };

    push_flash(&session, flash).await;
    Redirect::to("/profile").into_response()
}
