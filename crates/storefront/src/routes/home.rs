//! Catalog home page and the about page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use aqua_dekor_core::catalog::{
    self, BEST_SELLERS_LIMIT, Category, ProductSort, filter_by_category, sort_products,
};

use crate::error::AppError;
use crate::filters;
use crate::routes::layout::PageContext;
use crate::routes::products::{ProductCard, favorite_ids};
use crate::services::CatalogService;
use crate::state::AppState;

/// Query parameters of the catalog.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub active_category: String,
    pub sort: ProductSort,
    pub sorts: [ProductSort; 5],
    pub best_sellers: Vec<ProductCard>,
    pub product_of_the_day: Option<ProductCard>,
}

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub ctx: PageContext,
}

/// Display the catalog with the category filter and sort applied.
#[instrument(skip(state, ctx))]
pub async fn home(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CatalogQuery>,
) -> Result<HomeTemplate, AppError> {
    let catalog_service = CatalogService::new(state.supabase());

    let (products, categories, best) = tokio::join!(
        catalog_service.products(),
        catalog_service.categories(),
        catalog_service.best_sellers()
    );
    let products = products?;
    let categories = categories.unwrap_or_else(|e| {
        tracing::error!("Failed to load categories: {e}");
        Vec::new()
    });
    let best = best.unwrap_or_else(|e| {
        tracing::error!("Failed to load best sellers: {e}");
        catalog::best_sellers(&products, BEST_SELLERS_LIMIT)
    });

    let favorites = favorite_ids(&state, ctx.user.as_ref()).await;
    let card = |product: &catalog::Product| ProductCard::new(product.clone(), &favorites);

    let product_of_the_day = catalog::product_of_the_day(&best).map(card);
    let best_sellers = best.iter().map(card).collect();

    let active_category = query
        .category
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let sort = ProductSort::parse(query.sort.as_deref());

    let mut shown = filter_by_category(&products, Some(&active_category));
    sort_products(&mut shown, sort);

    Ok(HomeTemplate {
        products: shown.iter().map(card).collect(),
        categories,
        active_category,
        sort,
        sorts: ProductSort::ALL,
        best_sellers,
        product_of_the_day,
        ctx,
    })
}

/// Display the about page.
#[instrument(skip(ctx))]
pub async fn about(ctx: PageContext) -> AboutTemplate {
    AboutTemplate { ctx }
}
