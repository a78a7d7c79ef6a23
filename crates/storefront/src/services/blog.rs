//! Published articles for the blog.

use tracing::instrument;

use crate::supabase::types::Article;
use crate::supabase::{Direction, SupabaseClient, SupabaseError, tables};

use super::markdown::{excerpt, reading_time_minutes, render_markdown};

/// Teaser length on the blog index.
const EXCERPT_CHARS: usize = 180;

/// An article prepared for display.
#[derive(Debug, Clone)]
pub struct ArticleView {
    pub article: Article,
    pub excerpt: String,
    pub reading_time_minutes: u32,
}

impl ArticleView {
    #[must_use]
    pub fn new(article: Article) -> Self {
        Self {
            excerpt: excerpt(&article.content, EXCERPT_CHARS),
            reading_time_minutes: reading_time_minutes(&article.content),
            article,
        }
    }

    /// The body rendered to HTML.
    #[must_use]
    pub fn body_html(&self) -> String {
        render_markdown(&self.article.content)
    }

    #[must_use]
    pub fn author_name(&self) -> &str {
        self.article
            .author
            .as_ref()
            .map_or("AQUA DEKOR", |a| a.name())
    }
}

/// Blog reads, run with the anonymous key.
pub struct BlogService<'a> {
    client: &'a SupabaseClient,
}

impl<'a> BlogService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Published articles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn published(&self) -> Result<Vec<ArticleView>, SupabaseError> {
        let articles: Vec<Article> = self
            .client
            .table(tables::ARTICLES)
            .select(tables::ARTICLE_WITH_AUTHOR)
            .eq("published", true)
            .order("created_at", Direction::Desc)
            .fetch()
            .await?;
        Ok(articles.into_iter().map(ArticleView::new).collect())
    }

    /// A published article by slug.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` for unknown or unpublished slugs.
    #[instrument(skip(self))]
    pub async fn article(&self, slug: &str) -> Result<ArticleView, SupabaseError> {
        let article: Article = self
            .client
            .table(tables::ARTICLES)
            .select(tables::ARTICLE_WITH_AUTHOR)
            .eq("slug", slug)
            .eq("published", true)
            .fetch_one()
            .await?;
        Ok(ArticleView::new(article))
    }
}
