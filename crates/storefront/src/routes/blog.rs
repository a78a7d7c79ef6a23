//! Blog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::routes::layout::PageContext;
use crate::services::BlogService;
use crate::services::blog::ArticleView;
use crate::state::AppState;

/// Number of recent articles to show under an article.
const RECENT_ARTICLES_COUNT: usize = 3;

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub ctx: PageContext,
    pub articles: Vec<ArticleView>,
}

/// Article page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub ctx: PageContext,
    pub article: ArticleView,
    pub body_html: String,
    pub recent_articles: Vec<ArticleView>,
    /// Absolute URL for the canonical link.
    pub canonical_url: String,
}

/// Display the blog index page with all published articles.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let articles = BlogService::new(state.supabase())
        .published()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load articles: {e}");
            Vec::new()
        });

    BlogIndexTemplate { ctx, articles }
}

/// Display a single article by slug.
///
/// # Errors
///
/// Returns 404 if the article doesn't exist or is unpublished.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<BlogShowTemplate, AppError> {
    let blog = BlogService::new(state.supabase());
    let (article, recent) = tokio::join!(blog.article(&slug), blog.published());
    let article = article?;

    let recent_articles = recent
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load recent articles: {e}");
            Vec::new()
        })
        .into_iter()
        .filter(|a| a.article.slug != slug)
        .take(RECENT_ARTICLES_COUNT)
        .collect();

    Ok(BlogShowTemplate {
        body_html: article.body_html(),
        canonical_url: state.config().absolute_url(&format!("/blog/{slug}")),
        article,
        recent_articles,
        ctx,
    })
}

/// Create the blog routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{slug}", get(show))
}
