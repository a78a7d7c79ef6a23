//! The real storefront router served on a local port.

use std::net::{Ipv4Addr, SocketAddr};

use reqwest::{Client, Response, redirect::Policy};
use secrecy::SecretString;

use aqua_dekor_storefront::app;
use aqua_dekor_storefront::config::StorefrontConfig;
use aqua_dekor_storefront::state::AppState;

use crate::backend::FakeBackend;

/// 64+ characters, enough for a cookie signing key.
const SESSION_SECRET: &str =
    "kV9q2Lw7Zt4Rb8Nf1Xc6Hj3Ms5Pd0Ga7Ue2Yi9Ko4Tq8Wn1Bv6Cz3Lx5Rm0Fh7Sj2Dp";

/// A storefront wired to a [`FakeBackend`], plus a browser-like client
/// that keeps cookies and does not follow redirects.
pub struct TestApp {
    pub addr: SocketAddr,
    pub backend: FakeBackend,
    pub client: Client,
}

impl TestApp {
    /// Start the storefront against `backend`.
    ///
    /// Rate limiting is off so tests can sign in repeatedly.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or the router cannot be built.
    pub async fn spawn(backend: FakeBackend) -> Self {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("Failed to bind storefront");
        let addr = listener
            .local_addr()
            .expect("Storefront has no local address");

        let config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: format!("http://{addr}"),
            session_secret: SecretString::from(SESSION_SECRET),
            supabase: backend.config(),
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let router = app(AppState::new(config)).expect("Failed to build storefront router");

        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            addr,
            backend,
            client,
        }
    }

    /// Start a fresh backend and a storefront on top of it.
    pub async fn start() -> Self {
        Self::spawn(FakeBackend::start().await).await
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// GET as htmx would issue it.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn htmx_get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("htmx GET failed")
    }

    /// Submit a form the way a browser without JavaScript would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Submit a form the way htmx would.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("htmx POST failed")
    }

    /// Sign in through the login form; the session cookie is kept.
    pub async fn sign_in(&self, email: &str, password: &str) -> Response {
        self.post_form("/auth/login", &[("email", email), ("password", password)])
            .await
    }

    /// Sign in through the admin login form.
    pub async fn admin_sign_in(&self, email: &str, password: &str) -> Response {
        self.post_form("/admin/login", &[("email", email), ("password", password)])
            .await
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}
