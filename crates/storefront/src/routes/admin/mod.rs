//! Admin area: sign-in, dashboard and management pages.
//!
//! Every page except the login form requires [`RequireAdmin`]; the backend's
//! row-level policies check the admin's token again on each write.
//!
//! ```text
//! GET  /admin/login                  - Admin sign-in form
//! POST /admin/login                  - Admin sign-in (non-admins are signed out)
//! GET  /admin                        - Dashboard
//! GET  /admin/products               - Product list
//! GET  /admin/products/new           - New product form
//! POST /admin/products               - Create product
//! GET  /admin/products/{id}/edit     - Edit product form
//! POST /admin/products/{id}          - Update product
//! POST /admin/products/{id}/delete   - Delete product
//! GET  /admin/articles               - Article list (drafts included)
//! GET  /admin/articles/new           - New article form
//! POST /admin/articles               - Create article
//! GET  /admin/articles/{id}/edit     - Edit article form
//! POST /admin/articles/{id}          - Update article
//! POST /admin/articles/{id}/delete   - Delete article
//! POST /admin/articles/{id}/publish  - Publish / unpublish
//! GET  /admin/orders                 - Order list
//! POST /admin/orders/{id}/status     - Change order status
//! GET  /admin/users                  - User list
//! POST /admin/users/{id}/admin       - Grant / revoke admin
//! ```
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

pub mod articles;
pub mod dashboard;
pub mod login;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Admin sign-in routes; rate limited together with `/auth`.
pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", get(login::login_page).post(login::login))
}

/// Create the admin routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/logout", post(login::logout))
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/delete", post(products::delete))
        .route("/articles", get(articles::index).post(articles::create))
        .route("/articles/new", get(articles::new))
        .route("/articles/{id}", post(articles::update))
        .route("/articles/{id}/edit", get(articles::edit))
        .route("/articles/{id}/delete", post(articles::delete))
        .route("/articles/{id}/publish", post(articles::publish))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/status", post(orders::set_status))
        .route("/users", get(users::index))
        .route("/users/{id}/admin", post(users::set_admin))
}
