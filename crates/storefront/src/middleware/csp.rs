//! CSP nonce middleware for inline script protection.
//!
//! Each request gets a fresh nonce. The layout puts it on its one inline
//! `<script>` (the banner auto-hide) and `security_headers_middleware`
//! puts it in the `Content-Security-Policy` header.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// Origin the htmx script is loaded from.
pub const HTMX_ORIGIN: &str = "https://unpkg.com";

/// A CSP nonce value for inline scripts (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Get the nonce value for use in templates.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// The full `Content-Security-Policy` value for a page using this nonce.
    ///
    /// `img-src` allows any HTTPS host: product image URLs are entered
    /// freely in the admin panel.
    #[must_use]
    pub fn policy(&self) -> String {
        format!(
            "default-src 'none'; \
             script-src 'self' 'nonce-{nonce}' {HTMX_ORIGIN}; \
             style-src 'self'; \
             font-src 'self'; \
             img-src 'self' data: https:; \
             connect-src 'self'; \
             frame-src 'none'; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'",
            nonce = self.0
        )
    }
}

/// Middleware that generates a CSP nonce and stores it in request extensions.
///
/// Must run before `security_headers_middleware` so the nonce is available
/// when building the CSP header.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!(
                "CSP nonce not found in request extensions - middleware may be misconfigured"
            );
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }

    #[test]
    fn test_policy_carries_nonce_and_htmx() {
        let nonce = CspNonce("abc123".to_string());
        let policy = nonce.policy();
        assert!(policy.contains("'nonce-abc123'"));
        assert!(policy.contains(HTMX_ORIGIN));
        assert!(policy.starts_with("default-src 'none';"));
    }
}
