//! Client for the hosted backend (Supabase-compatible REST and auth APIs).
//!
//! # Architecture
//!
//! - Table access goes through PostgREST at `/rest/v1/<table>`; filters,
//!   ordering and embedding are expressed as query parameters
//! - Authentication goes through GoTrue at `/auth/v1/*`
//! - Every request carries the project key as `apikey`; the bearer is the
//!   signed-in user's access token when there is one, otherwise the key
//! - Row-level security is enforced remotely, so the storefront never needs
//!   elevated credentials
//! - No caching, no retries: each call maps 1:1 onto a remote request
//!
//! # Example
//!
//! ```rust,ignore
//! use aqua_dekor_storefront::supabase::{Direction, SupabaseClient, tables};
//!
//! let client = SupabaseClient::new(&config.supabase);
//!
//! let products: Vec<Product> = client
//!     .table(tables::PRODUCTS)
//!     .select("*,categories(id,name,slug)")
//!     .order("created_at", Direction::Desc)
//!     .fetch()
//!     .await?;
//! ```

mod auth;
mod query;
pub mod tables;
pub mod types;

pub use auth::{AuthSession, AuthUser, OtpType, SessionToken, SignUpMetadata, SignUpOutcome};
pub use query::{Direction, Query};

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::SupabaseConfig;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A single-row fetch matched no rows.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The token was missing, expired or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An update or delete without any filter would touch every row.
    #[error("Refusing unfiltered {operation} on {table}")]
    UnfilteredWrite {
        operation: &'static str,
        table: String,
    },
}

impl SupabaseError {
    /// The banner text shown to shoppers for this error.
    ///
    /// Known auth messages get their storefront wording; other client-side
    /// rejections pass the backend's message through; everything else gets
    /// a generic apology.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                status, message, ..
            } => {
                if let Some(translated) = translate_auth_message(message) {
                    translated.to_string()
                } else if (400..500).contains(status) && !message.is_empty() {
                    message.clone()
                } else {
                    GENERIC_ERROR.to_string()
                }
            }
            Self::Unauthorized(message) => translate_auth_message(message)
                .unwrap_or("Сессия истекла. Пожалуйста, войдите снова.")
                .to_string(),
            Self::NotFound(_) => "Запись не найдена".to_string(),
            Self::RateLimited(_) => "Слишком много запросов. Попробуйте позже.".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::InvalidUrl(_) | Self::UnfilteredWrite { .. } => {
                GENERIC_ERROR.to_string()
            }
        }
    }

    /// Whether this is a client-side rejection rather than an outage.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 400 && *status < 500,
            Self::NotFound(_) | Self::Unauthorized(_) | Self::RateLimited(_) => true,
            _ => false,
        }
    }
}

const GENERIC_ERROR: &str = "Произошла ошибка. Попробуйте позже.";

/// Storefront wording for the auth service's well-known messages.
fn translate_auth_message(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if lower.contains("invalid login credentials") {
        Some("Неверный email или пароль")
    } else if lower.contains("email not confirmed") {
        Some("Email не подтвержден. Пожалуйста, проверьте вашу почту.")
    } else if lower.contains("user already registered") {
        Some("Пользователь с таким email уже существует")
    } else {
        None
    }
}

// =============================================================================
// SupabaseClient
// =============================================================================

/// Client for the hosted backend's REST and auth APIs.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl SupabaseClient {
    /// Create a new client for the configured project.
    #[must_use]
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseClientInner {
                http: reqwest::Client::new(),
                base_url: config.url.as_str().trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
            }),
        }
    }

    /// Start a query against a table.
    pub fn table(&self, table: &str) -> Query<'_> {
        Query::new(self, table)
    }

    /// Call a database function through `/rest/v1/rpc/<function>`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the request fails or the result does not
    /// deserialize into `T`.
    #[instrument(skip(self, args, token))]
    pub async fn rpc<A, T>(
        &self,
        function: &str,
        args: &A,
        token: Option<&SessionToken>,
    ) -> Result<T, SupabaseError>
    where
        A: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.rest_url(&format!("rpc/{function}"))?;
        let request = self
            .request(reqwest::Method::POST, url, token.map(SessionToken::expose))
            .json(args);
        let body = self.send(request).await?;
        parse_body(&body)
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    pub(crate) fn rest_url(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(Url::parse(&format!("{}/rest/v1/{path}", self.inner.base_url))?)
    }

    pub(crate) fn auth_url(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(Url::parse(&format!("{}/auth/v1/{path}", self.inner.base_url))?)
    }

    /// Build a request with the `apikey` header and a bearer token.
    ///
    /// Without a user token the project key doubles as the bearer.
    pub(crate) fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        bearer: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let key = self.inner.api_key.expose_secret();
        self.inner
            .http
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(bearer.unwrap_or(key))
    }

    /// Send a request and return the body of a successful response.
    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<String, SupabaseError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(SupabaseError::RateLimited(retry_after));
        }

        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let (code, message) = parse_error_body(status, &body);
        tracing::warn!(
            status = %status,
            code = code.as_deref().unwrap_or(""),
            message = %message,
            "Backend returned non-success status"
        );

        Err(match status {
            StatusCode::UNAUTHORIZED => SupabaseError::Unauthorized(message),
            StatusCode::NOT_ACCEPTABLE => SupabaseError::NotFound(message),
            _ => SupabaseError::Api {
                status: status.as_u16(),
                code,
                message,
            },
        })
    }
}

/// Deserialize a response body, logging the payload on failure.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, SupabaseError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        SupabaseError::Parse(e)
    })
}

/// Pull `(code, message)` out of a PostgREST or GoTrue error body.
///
/// PostgREST sends `{code, message, details, hint}`; GoTrue sends either
/// `{error, error_description}` or `{code, error_code, msg}`.
fn parse_error_body(status: StatusCode, body: &str) -> (Option<String>, String) {
    let fallback = || {
        let text: String = body.trim().chars().take(200).collect();
        if text.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            text
        }
    };

    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body)
    else {
        return (None, fallback());
    };

    let message = ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| map.get(*key).and_then(serde_json::Value::as_str))
        .map_or_else(fallback, str::to_string);

    let code = ["error_code", "code"].iter().find_map(|key| {
        map.get(*key).and_then(|value| match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    });

    (code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_postgrest_error() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint","details":null,"hint":null}"#;
        let (code, message) = parse_error_body(StatusCode::CONFLICT, body);
        assert_eq!(code.as_deref(), Some("23505"));
        assert_eq!(message, "duplicate key value violates unique constraint");
    }

    #[test]
    fn test_parse_gotrue_errors() {
        let legacy = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let (_, message) = parse_error_body(StatusCode::BAD_REQUEST, legacy);
        assert_eq!(message, "Invalid login credentials");

        let current = r#"{"code":400,"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#;
        let (code, message) = parse_error_body(StatusCode::BAD_REQUEST, current);
        assert_eq!(code.as_deref(), Some("email_not_confirmed"));
        assert_eq!(message, "Email not confirmed");
    }

    #[test]
    fn test_parse_non_json_error() {
        let (code, message) = parse_error_body(StatusCode::BAD_GATEWAY, "");
        assert!(code.is_none());
        assert_eq!(message, "Bad Gateway");
    }

    #[test]
    fn test_user_message_translates_auth_errors() {
        let api = |message: &str| SupabaseError::Api {
            status: 400,
            code: None,
            message: message.to_string(),
        };

        assert_eq!(
            api("Invalid login credentials").user_message(),
            "Неверный email или пароль"
        );
        assert_eq!(
            api("Email not confirmed").user_message(),
            "Email не подтвержден. Пожалуйста, проверьте вашу почту."
        );
        assert_eq!(
            api("User already registered").user_message(),
            "Пользователь с таким email уже существует"
        );
        assert_eq!(
            api("Password should be at least 6 characters").user_message(),
            "Password should be at least 6 characters"
        );
    }

    #[test]
    fn test_user_message_hides_server_errors() {
        let err = SupabaseError::Api {
            status: 500,
            code: None,
            message: "connection refused to db-primary".to_string(),
        };
        assert_eq!(err.user_message(), GENERIC_ERROR);
        assert!(!err.is_client_error());
        assert!(SupabaseError::RateLimited(3).is_client_error());
    }

    #[test]
    fn test_error_display() {
        let err = SupabaseError::NotFound("products".to_string());
        assert_eq!(err.to_string(), "Not found: products");
        let err = SupabaseError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
