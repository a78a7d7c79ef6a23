//! Favorites route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aqua_dekor_core::ProductId;
use aqua_dekor_core::favorites::{FavoriteWrite, Favorites};

use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, push_flash};
use crate::models::Flash;
use crate::routes::fragments::{
    FAVORITES_UPDATED, FavoritesCountTemplate, banner_response, is_htmx,
};
use crate::routes::layout::PageContext;
use crate::routes::products::ProductCard;
use crate::services::FavoritesService;
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteForm {
    pub product_id: ProductId,
}

/// Favorites page template.
#[derive(Template, WebTemplate)]
#[template(path = "favorites.html")]
pub struct FavoritesTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCard>,
}

/// Heart button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/favorite_button.html")]
pub struct FavoriteButtonTemplate {
    pub product_id: ProductId,
    pub is_favorite: bool,
}

/// Display the user's favorite products.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let favorites = match &ctx.user {
        Some(user) => FavoritesService::new(state.supabase(), user)
            .load()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to load favorites: {e}");
                Favorites::default()
            }),
        None => Favorites::default(),
    };

    let products = favorites
        .products()
        .iter()
        .map(|product| ProductCard {
            product: product.clone(),
            is_favorite: true,
        })
        .collect();

    FavoritesTemplate { ctx, products }
}

/// Add or remove a favorite (HTMX). Answers with the updated heart button.
#[instrument(skip(state, session, user, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<ToggleFavoriteForm>,
) -> Response {
    let service = FavoritesService::new(state.supabase(), &user);
    let result = match service.load().await {
        Ok(mut favorites) => service.toggle(&mut favorites, form.product_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(write) => {
            let is_favorite = matches!(write, FavoriteWrite::Add(_));
            if !is_htmx(&headers) {
                return Redirect::to("/favorites").into_response();
            }
            (
                AppendHeaders([("HX-Trigger", FAVORITES_UPDATED)]),
                FavoriteButtonTemplate {
                    product_id: form.product_id,
                    is_favorite,
                },
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to toggle favorite {}: {e}", form.product_id);
            let flash = Flash::error(e.user_message());
            if is_htmx(&headers) {
                return banner_response(&flash);
            }
            push_flash(&session, flash).await;
            Redirect::to("/favorites").into_response()
        }
    }
}

/// Get favorites count badge (HTMX).
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let count = match &user {
        Some(user) => FavoritesService::new(state.supabase(), user)
            .load()
            .await
            .map(|f| f.len())
            .unwrap_or(0),
        None => 0,
    };

    FavoritesCountTemplate { count }
}
