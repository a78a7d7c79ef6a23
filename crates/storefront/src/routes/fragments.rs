//! HTMX fragments shared by several handlers: the banner and header badges.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::middleware::push_flash;
use crate::models::Flash;

/// Event the header badges listen for after a cart change.
pub const CART_UPDATED: &str = "cart-updated";

/// Event the header badges listen for after a favorites change.
pub const FAVORITES_UPDATED: &str = "favorites-updated";

/// Fixed-position banner content.
#[derive(Template, WebTemplate)]
#[template(path = "partials/banner.html")]
pub struct BannerTemplate {
    pub flash: Flash,
}

/// Cart badge in the header.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Favorites badge in the header.
#[derive(Template, WebTemplate)]
#[template(path = "partials/favorites_count.html")]
pub struct FavoritesCountTemplate {
    pub count: usize,
}

/// Whether the request was issued by htmx.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Render the banner into `#banner`, whatever element the request targeted.
#[must_use]
pub fn banner_response(flash: &Flash) -> Response {
    (
        AppendHeaders([("HX-Retarget", "#banner"), ("HX-Reswap", "innerHTML")]),
        BannerTemplate {
            flash: flash.clone(),
        },
    )
        .into_response()
}

/// Banner plus an `HX-Trigger` event, for mutations that also refresh badges.
#[must_use]
pub fn banner_with_trigger(flash: &Flash, event: &'static str) -> Response {
    (
        AppendHeaders([
            ("HX-Retarget", "#banner"),
            ("HX-Reswap", "innerHTML"),
            ("HX-Trigger", event),
        ]),
        BannerTemplate {
            flash: flash.clone(),
        },
    )
        .into_response()
}

/// Respond to a form post: the banner for htmx, otherwise a redirect that
/// shows it on the next page.
pub async fn flash_or_redirect(
    headers: &HeaderMap,
    session: &Session,
    flash: Flash,
    redirect_to: &str,
) -> Response {
    if is_htmx(headers) {
        return banner_response(&flash);
    }
    push_flash(session, flash).await;
    Redirect::to(redirect_to).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};

    use super::*;

    #[test]
    fn test_banner_response_retargets() {
        let response = banner_response(&Flash::error("Ошибка"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("HX-Retarget"),
            Some(&HeaderValue::from_static("#banner"))
        );
        assert_eq!(
            response.headers().get("HX-Reswap"),
            Some(&HeaderValue::from_static("innerHTML"))
        );
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
