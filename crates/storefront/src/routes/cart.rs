//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Lines live in the remote `cart_items` table, so every action needs a
//! signed-in user; anonymous visitors get the sign-in banner and nothing is
//! written.

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
use aqua_dekor_core::cart::Cart;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, push_flash};
use crate::models::{CurrentUser, Flash};
use crate::routes::fragments::{
    CART_UPDATED, CartCountTemplate, banner_response, banner_with_trigger, flash_or_redirect,
    is_htmx,
};
use crate::routes::layout::PageContext;
use crate::services::CartService;
use crate::state::AppState;
use crate::supabase::SupabaseError;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: Cart,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: Cart,
}

async fn load_cart(state: &AppState, user: &CurrentUser) -> Cart {
    match CartService::new(state.supabase(), user).load().await {
        Ok(cart) => cart,
        Err(e) => {
            tracing::warn!("Failed to load cart: {e}");
            Cart::default()
        }
    }
}

/// Display cart page.
#[instrument(skip(state, ctx))]
pub async fn show(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let cart = match &ctx.user {
        Some(user) => load_cart(&state, user).await,
        None => Cart::default(),
    };

    CartShowTemplate { ctx, cart }
}

/// Add one unit of a product to the cart (HTMX).
///
/// Answers with the confirmation banner and an HTMX trigger that refreshes
/// the cart badge.
#[instrument(skip(state, session, user, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let service = CartService::new(state.supabase(), &user);
    let result = match service.load().await {
        Ok(mut cart) => service.add(&mut cart, form.product_id).await,
        Err(e) => Err(e),
    };

    let flash = match result {
        Ok(()) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", &form.product_id.to_string())]),
            );
            Flash::success("Товар добавлен в корзину")
        }
        Err(e) => {
            tracing::error!("Failed to add product {} to cart: {e}", form.product_id);
            let flash = Flash::error(e.user_message());
            if is_htmx(&headers) {
                return banner_response(&flash);
            }
            flash
        }
    };

    if is_htmx(&headers) {
        return banner_with_trigger(&flash, CART_UPDATED);
    }
    push_flash(&session, flash).await;
    Redirect::to("/cart").into_response()
}

/// Update cart line quantity (HTMX). Zero removes the line.
#[instrument(skip(state, session, user, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let service = CartService::new(state.supabase(), &user);
    let mut cart = match service.load().await {
        Ok(cart) => cart,
        Err(e) => {
            tracing::error!("Failed to load cart: {e}");
            return failure(&headers, &session, &e).await;
        }
    };

    if let Err(e) = service
        .set_quantity(&mut cart, form.product_id, form.quantity)
        .await
    {
        tracing::error!("Failed to update cart: {e}");
        return failure(&headers, &session, &e).await;
    }

    items_response(&headers, cart)
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, user, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let service = CartService::new(state.supabase(), &user);
    let mut cart = match service.load().await {
        Ok(cart) => cart,
        Err(e) => {
            tracing::error!("Failed to load cart: {e}");
            return failure(&headers, &session, &e).await;
        }
    };

    if let Err(e) = service.remove(&mut cart, form.product_id).await {
        tracing::error!("Failed to remove from cart: {e}");
        return failure(&headers, &session, &e).await;
    }

    items_response(&headers, cart)
}

/// The error banner for htmx, or a flash on the cart page.
async fn failure(headers: &HeaderMap, session: &Session, err: &SupabaseError) -> Response {
    flash_or_redirect(headers, session, Flash::error(err.user_message()), "/cart").await
}

/// The refreshed cart lines for htmx, or back to the cart page.
fn items_response(headers: &HeaderMap, cart: Cart) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let count = match &user {
        Some(user) => load_cart(&state, user).await.item_count(),
        None => 0,
    };

    CartCountTemplate { count }
}
