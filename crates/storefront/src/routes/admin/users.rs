//! User list and admin flag management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aqua_dekor_core::UserId;

use crate::filters;
use crate::middleware::{RequireAdmin, push_flash};
use crate::models::Flash;
use crate::routes::layout::PageContext;
use crate::services::AdminService;
use crate::state::AppState;
use crate::supabase::types::Profile;

const CURRENT_PATH: &str = "/admin/users";

/// Admin flag form data.
#[derive(Debug, Deserialize)]
pub struct AdminFlagForm {
    pub is_admin: bool,
}

/// Users page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub users: Vec<Profile>,
    /// The signed-in admin, who cannot revoke their own flag.
    pub self_id: UserId,
}

/// Users list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> UsersIndexTemplate {
    let users = AdminService::new(state.supabase(), Some(&admin.access_token))
        .users()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch users: {e}");
            vec![]
        });

    UsersIndexTemplate {
        ctx,
        current_path: CURRENT_PATH,
        users,
        self_id: admin.id,
    }
}

/// Grant or revoke the admin flag.
#[instrument(skip(admin, state, session))]
pub async fn set_admin(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
    Form(form): Form<AdminFlagForm>,
) -> Redirect {
    let flash = if id == admin.id && !form.is_admin {
        Flash::error("Нельзя снять права администратора с самого себя")
    } else {
        match AdminService::new(state.supabase(), Some(&admin.access_token))
            .set_admin(id, form.is_admin)
            .await
        {
            Ok(()) if form.is_admin => Flash::success("Права администратора выданы"),
            Ok(()) => Flash::success("Права администратора сняты"),
            Err(e) => {
                tracing::error!("Failed to change admin flag of {id}: {e}");
                Flash::error(e.user_message())
            }
        }
    };

    push_flash(&session, flash).await;
    Redirect::to(CURRENT_PATH)
}
