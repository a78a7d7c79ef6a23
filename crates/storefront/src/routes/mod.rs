//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (?category=slug&sort=key)
//! GET  /about                  - About page
//!
//! # Products
//! GET  /products/{id}            - Product detail with reviews
//! GET  /products/{id}/quick-view - Quick view fragment (HTMX)
//! POST /products/{id}/reviews    - Post a review
//! POST /reviews/{id}             - Edit own review
//! POST /reviews/{id}/delete      - Delete own review
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (banner, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Favorites
//! GET  /favorites              - Favorites page
//! POST /favorites/toggle       - Toggle (returns heart button fragment)
//! GET  /favorites/count        - Favorites count badge (fragment)
//!
//! # Blog
//! GET  /blog                   - Published articles
//! GET  /blog/{slug}            - Article
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! GET  /auth/callback          - Email confirmation landing
//!
//! # Profile (requires auth)
//! GET  /profile                - Profile page
//! POST /profile                - Save profile
//!
//! # Admin
//! /admin/...                   - See [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod favorites;
pub mod fragments;
pub mod home;
pub mod layout;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(products::show))
        .route("/{id}/quick-view", get(products::quick_view))
        .route("/{id}/reviews", post(products::create_review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the favorites routes router.
pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route("/toggle", post(favorites::toggle))
        .route("/count", get(favorites::count))
}

/// Sign-in and registration forms, rate limited per client IP when
/// `rate_limit` is set.
fn credential_routes(rate_limit: bool) -> Router<AppState> {
    let router = Router::new()
        .nest("/auth", auth_routes())
        .nest("/admin", admin::login_routes());

    if !rate_limit {
        return router;
    }
    match auth_rate_limiter() {
        Some(limiter) => router.layer(limiter),
        None => {
            tracing::error!("Invalid rate limiter quota, auth routes are not rate limited");
            router
        }
    }
}

/// Create all routes for the storefront.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/", get(home::home))
        .route("/about", get(home::about))
        .nest("/products", product_routes())
        // Reviews
        .route("/reviews/{id}", post(products::update_review))
        .route("/reviews/{id}/delete", post(products::delete_review))
        // Cart & favorites
        .nest("/cart", cart_routes())
        .nest("/favorites", favorites_routes())
        // Blog
        .nest("/blog", blog::router())
        // Auth
        .merge(credential_routes(rate_limit))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/callback", get(auth::callback))
        // Profile
        .route("/profile", get(profile::show).post(profile::update))
        // Admin
        .nest("/admin", admin::router())
}
