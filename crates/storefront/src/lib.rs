//! AQUA DEKOR storefront library.
//!
//! Server-rendered shop (catalog, cart, favorites, reviews, blog, profile)
//! and admin area on top of a hosted backend's REST and auth APIs. The
//! router is built here so it can be tested in-process; `main.rs` only
//! wires configuration, tracing and the listener.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::ErrorTemplate;
use crate::middleware::{
    SessionSetupError, create_session_layer, csp_nonce_middleware, request_id_middleware,
    security_headers_middleware,
};
use crate::routes::layout::PageContext;
use crate::state::AppState;
use crate::supabase::tables;

/// Directory served under `/static`.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the application router with all middleware layers.
///
/// # Errors
///
/// Returns `SessionSetupError` if the session secret cannot be used as a
/// cookie signing key.
pub fn app(state: AppState) -> Result<Router, SessionSetupError> {
    let session_layer = create_session_layer(state.config())?;
    let rate_limit = state.config().rate_limit;

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(rate_limit))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(not_found)
        .layer(session_layer)
        // Layers run outermost-last: request id, then nonce, then headers
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(csp_nonce_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Runs a one-row query against the backend. Returns 503 Service
/// Unavailable if it is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state
        .supabase()
        .table(tables::CATEGORIES)
        .select("id")
        .limit(1)
        .fetch::<serde_json::Value>()
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Page for unknown paths.
async fn not_found(ctx: PageContext) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        ErrorTemplate {
            ctx,
            status: StatusCode::NOT_FOUND.as_u16(),
            message: "Страница не найдена".to_string(),
        },
    )
}
