//! Article management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aqua_dekor_core::ArticleId;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, push_flash};
use crate::models::{CurrentUser, Flash};
use crate::routes::layout::PageContext;
use crate::services::AdminService;
use crate::services::admin::ArticleFields;
use crate::state::AppState;
use crate::supabase::types::Article;

const CURRENT_PATH: &str = "/admin/articles";

/// Publish toggle form data.
#[derive(Debug, Deserialize)]
pub struct PublishForm {
    pub published: bool,
}

/// Article list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/articles/index.html")]
pub struct ArticlesIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub articles: Vec<Article>,
}

/// Article create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/articles/form.html")]
pub struct ArticleFormTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub article_id: Option<ArticleId>,
    pub fields: ArticleFields,
    pub error: Option<String>,
}

impl ArticleFormTemplate {
    #[must_use]
    pub fn action(&self) -> String {
        self.article_id
            .map_or_else(|| CURRENT_PATH.to_string(), |id| format!("{CURRENT_PATH}/{id}"))
    }
}

/// Article list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> ArticlesIndexTemplate {
    let articles = AdminService::new(state.supabase(), Some(&admin.access_token))
        .articles()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch articles: {e}");
            vec![]
        });

    ArticlesIndexTemplate {
        ctx,
        current_path: CURRENT_PATH,
        articles,
    }
}

/// New article form.
#[instrument(skip_all)]
pub async fn new(RequireAdmin(_admin): RequireAdmin, ctx: PageContext) -> ArticleFormTemplate {
    ArticleFormTemplate {
        ctx,
        current_path: CURRENT_PATH,
        article_id: None,
        fields: ArticleFields::default(),
        error: None,
    }
}

/// Edit article form.
#[instrument(skip(admin, state, ctx))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<ArticleId>,
) -> Result<ArticleFormTemplate, AppError> {
    let article = AdminService::new(state.supabase(), Some(&admin.access_token))
        .article(id)
        .await?;

    Ok(ArticleFormTemplate {
        ctx,
        current_path: CURRENT_PATH,
        article_id: Some(id),
        fields: ArticleFields::from_article(&article),
        error: None,
    })
}

/// Create an article authored by the signed-in admin.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(fields): Form<ArticleFields>,
) -> Response {
    save(&state, &session, ctx, &admin, None, fields).await
}

/// Update an article. The original author is kept.
#[instrument(skip(admin, state, session, ctx, fields))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<ArticleId>,
    Form(fields): Form<ArticleFields>,
) -> Response {
    save(&state, &session, ctx, &admin, Some(id), fields).await
}

async fn save(
    state: &AppState,
    session: &Session,
    ctx: PageContext,
    admin: &CurrentUser,
    article_id: Option<ArticleId>,
    fields: ArticleFields,
) -> Response {
    let service = AdminService::new(state.supabase(), Some(&admin.access_token));
    let author_id = article_id.is_none().then_some(admin.id);

    let result = match fields.to_input(author_id, Utc::now()) {
        Err(message) => Err(message),
        Ok(input) => match article_id {
            Some(id) => service.update_article(id, &input).await,
            None => service.create_article(&input).await,
        }
        .map_err(|e| {
            tracing::error!("Failed to save article: {e}");
            e.user_message()
        }),
    };

    match result {
        Ok(()) => {
            let message = if article_id.is_some() {
                "Статья обновлена"
            } else {
                "Статья создана"
            };
            push_flash(session, Flash::success(message)).await;
            Redirect::to(CURRENT_PATH).into_response()
        }
        Err(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ArticleFormTemplate {
                ctx,
                current_path: CURRENT_PATH,
                article_id,
                fields,
                error: Some(message),
            },
        )
            .into_response(),
    }
}

/// Delete an article.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ArticleId>,
) -> Redirect {
    let flash = match AdminService::new(state.supabase(), Some(&admin.access_token))
        .delete_article(id)
        .await
    {
        Ok(()) => Flash::success("Статья удалена"),
        Err(e) => {
            tracing::error!("Failed to delete article {id}: {e}");
            Flash::error(e.user_message())
        }
    };

    push_flash(&session, flash).await;
    Redirect::to(CURRENT_PATH)
}

/// Publish or unpublish an article.
#[instrument(skip(admin, state, session))]
pub async fn publish(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ArticleId>,
    Form(form): Form<PublishForm>,
) -> Redirect {
    let flash = match AdminService::new(state.supabase(), Some(&admin.access_token))
        .set_published(id, form.published)
        .await
    {
        Ok(()) if form.published => Flash::success("Статья опубликована"),
        Ok(()) => Flash::success("Статья снята с публикации"),
        Err(e) => {
            tracing::error!("Failed to change publication of article {id}: {e}");
            Flash::error(e.user_message())
        }
    };

    push_flash(&session, flash).await;
    Redirect::to(CURRENT_PATH)
}
