//! Product page, quick-view modal and review route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aqua_dekor_core::catalog::Product;
use aqua_dekor_core::{ProductId, Rating, RatingError, ReviewId, UserId, format_rating};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, push_flash};
use crate::models::{CurrentUser, Flash};
use crate::routes::fragments::flash_or_redirect;
use crate::routes::layout::PageContext;
use crate::services::{CatalogService, FavoritesService, ReviewService};
use crate::state::AppState;
use crate::supabase::types::Review;

/// How many reviews the quick-view modal shows.
const QUICK_VIEW_REVIEWS: usize = 3;

/// A product with the viewer's favorite state, for cards and detail pages.
#[derive(Clone)]
pub struct ProductCard {
    pub product: Product,
    pub is_favorite: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: Product, favorites: &[ProductId]) -> Self {
        let is_favorite = favorites.contains(&product.id);
        Self {
            product,
            is_favorite,
        }
    }

    /// Average rating with one decimal.
    #[must_use]
    pub fn rating_label(&self) -> String {
        format_rating(self.product.rating)
    }
}

/// A review with whether the viewer wrote it.
#[derive(Clone)]
pub struct ReviewView {
    pub review: Review,
    pub is_own: bool,
}

impl ReviewView {
    fn list(reviews: Vec<Review>, viewer: Option<UserId>) -> Vec<Self> {
        reviews
            .into_iter()
            .map(|review| {
                let is_own = viewer == Some(review.user_id);
                Self { review, is_own }
            })
            .collect()
    }

    /// CSS classes of the five stars.
    #[must_use]
    pub fn star_classes(&self) -> Vec<&'static str> {
        self.review
            .rating
            .fills()
            .into_iter()
            .map(aqua_dekor_core::StarFill::css_class)
            .collect()
    }
}

/// Ids of the viewer's favorite products; empty for anonymous visitors or
/// when the lookup fails.
pub async fn favorite_ids(state: &AppState, user: Option<&CurrentUser>) -> Vec<ProductId> {
    let Some(user) = user else {
        return Vec::new();
    };
    match FavoritesService::new(state.supabase(), user).load().await {
        Ok(favorites) => favorites.ids(),
        Err(e) => {
            tracing::warn!("Failed to load favorites: {e}");
            Vec::new()
        }
    }
}

/// Product page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub card: ProductCard,
    pub specifications: Vec<(String, String)>,
    pub reviews: Vec<ReviewView>,
}

/// Quick-view modal fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub card: ProductCard,
    pub specifications: Vec<(String, String)>,
    pub reviews: Vec<ReviewView>,
    pub review_count: usize,
    pub signed_in: bool,
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    /// Absent when no star was picked.
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

/// Review edit form data; carries the product to return to.
#[derive(Debug, Deserialize)]
pub struct ReviewEditForm {
    pub product_id: ProductId,
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

/// Review delete form data.
#[derive(Debug, Deserialize)]
pub struct ReviewDeleteForm {
    pub product_id: ProductId,
}

fn rating_message(err: RatingError) -> &'static str {
    match err {
        RatingError::Missing => "Пожалуйста, поставьте оценку",
        RatingError::OutOfRange(_) => "Оценка должна быть от 1 до 5",
    }
}

fn product_path(id: ProductId) -> String {
    format!("/products/{id}#reviews")
}

/// Display a product with its specifications and reviews.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<ProductId>,
) -> Result<ProductShowTemplate, AppError> {
    let catalog = CatalogService::new(state.supabase());
    let (product, reviews) = tokio::join!(catalog.product(id), catalog.reviews(id));
    let product = product?;
    let reviews = reviews.unwrap_or_else(|e| {
        tracing::error!("Failed to load reviews for product {id}: {e}");
        Vec::new()
    });

    let favorites = favorite_ids(&state, ctx.user.as_ref()).await;
    let viewer = ctx.user.as_ref().map(|u| u.id);

    Ok(ProductShowTemplate {
        specifications: product.specification_rows(),
        card: ProductCard::new(product, &favorites),
        reviews: ReviewView::list(reviews, viewer),
        ctx,
    })
}

/// Quick-view modal for a product card (HTMX).
#[instrument(skip(state, user))]
pub async fn quick_view(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<QuickViewTemplate, AppError> {
    let catalog = CatalogService::new(state.supabase());
    let (product, reviews) = tokio::join!(catalog.product(id), catalog.reviews(id));
    let product = product?;
    let reviews = reviews.unwrap_or_else(|e| {
        tracing::warn!("Failed to load reviews for product {id}: {e}");
        Vec::new()
    });

    let favorites = favorite_ids(&state, user.as_ref()).await;
    let viewer = user.as_ref().map(|u| u.id);
    let review_count = reviews.len();
    let mut reviews = ReviewView::list(reviews, viewer);
    reviews.truncate(QUICK_VIEW_REVIEWS);

    Ok(QuickViewTemplate {
        specifications: product.specification_rows(),
        card: ProductCard::new(product, &favorites),
        reviews,
        review_count,
        signed_in: user.is_some(),
    })
}

/// Post a review.
#[instrument(skip(state, session, user, headers, form))]
pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let back = product_path(id);
    let rating = match Rating::new(form.rating.unwrap_or(0)) {
        Ok(rating) => rating,
        Err(e) => {
            return flash_or_redirect(&headers, &session, Flash::error(rating_message(e)), &back)
                .await;
        }
    };

    let flash = match ReviewService::new(state.supabase(), &user)
        .create(id, rating, &form.comment)
        .await
    {
        Ok(()) => Flash::success("Спасибо за отзыв!"),
        Err(e) => {
            tracing::error!("Failed to create review: {e}");
            Flash::error(e.user_message())
        }
    };

    push_flash(&session, flash).await;
    Redirect::to(&back).into_response()
}

/// Edit one of the user's reviews.
#[instrument(skip(state, session, user, headers, form))]
pub async fn update_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Path(id): Path<ReviewId>,
    Form(form): Form<ReviewEditForm>,
) -> Response {
    let back = product_path(form.product_id);
    let rating = match Rating::new(form.rating.unwrap_or(0)) {
        Ok(rating) => rating,
        Err(e) => {
            return flash_or_redirect(&headers, &session, Flash::error(rating_message(e)), &back)
                .await;
        }
    };

    let flash = match ReviewService::new(state.supabase(), &user)
        .update(id, rating, &form.comment)
        .await
    {
        Ok(()) => Flash::success("Отзыв обновлён"),
        Err(e) => {
            tracing::error!("Failed to update review {id}: {e}");
            Flash::error(e.user_message())
        }
    };

    push_flash(&session, flash).await;
    Redirect::to(&back).into_response()
}

/// Delete one of the user's reviews.
#[instrument(skip(state, session, user, form))]
pub async fn delete_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReviewId>,
    Form(form): Form<ReviewDeleteForm>,
) -> Response {
    let flash = match ReviewService::new(state.supabase(), &user).delete(id).await {
        Ok(()) => Flash::success("Отзыв удалён"),
        Err(e) => {
            tracing::error!("Failed to delete review {id}: {e}");
            Flash::error(e.user_message())
        }
    };

    push_flash(&session, flash).await;
    Redirect::to(&product_path(form.product_id)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_messages() {
        assert_eq!(
            rating_message(RatingError::Missing),
            "Пожалуйста, поставьте оценку"
        );
        assert_eq!(
            rating_message(RatingError::OutOfRange(9)),
            "Оценка должна быть от 1 до 5"
        );
    }

    #[test]
    fn test_review_ownership() {
        let viewer: UserId = "8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f".parse().unwrap();
        let review: Review = serde_json::from_value(serde_json::json!({
            "id": 1,
            "product_id": 2,
            "user_id": "8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f",
            "rating": 4,
            "comment": "Удобный",
            "created_at": "2025-03-01T10:00:00Z"
        }))
        .unwrap();

        let own = ReviewView::list(vec![review.clone()], Some(viewer));
        assert!(own.first().unwrap().is_own);
        assert_eq!(
            own.first().unwrap().star_classes().last(),
            Some(&"star star-empty")
        );

        let anonymous = ReviewView::list(vec![review], None);
        assert!(!anonymous.first().unwrap().is_own);
    }
}
