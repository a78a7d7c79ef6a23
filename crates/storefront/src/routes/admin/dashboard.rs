//! Admin dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::layout::PageContext;
use crate::services::AdminService;
use crate::services::admin::DashboardCounts;
use crate::state::AppState;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub counts: DashboardCounts,
}

/// Dashboard page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> DashboardTemplate {
    let counts = AdminService::new(state.supabase(), Some(&admin.access_token))
        .dashboard()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load dashboard counts: {e}");
            DashboardCounts::default()
        });

    DashboardTemplate {
        ctx,
        current_path: "/admin",
        counts,
    }
}
