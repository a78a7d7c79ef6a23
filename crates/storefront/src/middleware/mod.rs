//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for inline scripts)
//! 5. Security headers (CSP with the nonce, frame and referrer policies)
//! 6. Session layer (tower-sessions, in-memory store, signed cookie)
//! 7. Rate limiting on the auth endpoints (governor)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, current_user, set_current_user,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SessionSetupError, create_session_layer, push_flash, take_flash};
