//! GoTrue-compatible authentication calls.

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::instrument;

use aqua_dekor_core::{Email, UserId};

use super::{SupabaseClient, SupabaseError, parse_body};

/// An access or refresh token issued by the auth service.
///
/// Serializable so it can live in the server-side session; `Debug` never
/// prints the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// A signed-in session as returned by the token and verify endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: SessionToken,
    pub refresh_token: SessionToken,
    #[serde(default)]
    pub expires_in: i64,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    /// Expiry as a unix timestamp, derived from `expires_in` when the
    /// backend omits `expires_at`.
    #[must_use]
    pub fn expires_at_or_now_plus(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at
            .unwrap_or_else(|| now.timestamp() + self.expires_in)
    }
}

/// The auth service's view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

/// Extra profile data attached to a sign-up.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignUpMetadata {
    pub first_name: String,
    pub last_name: String,
}

/// Result of a sign-up.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    /// Email confirmation is disabled; the user is signed in right away.
    SignedIn(AuthSession),
    /// A confirmation email was sent.
    ConfirmationRequired(AuthUser),
}

/// Kind of one-time token carried by an email link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Signup,
    Email,
    Magiclink,
    Recovery,
    Invite,
    EmailChange,
}

impl OtpType {
    /// Parse the `type` query parameter of an email link.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "signup" => Some(Self::Signup),
            "email" => Some(Self::Email),
            "magiclink" => Some(Self::Magiclink),
            "recovery" => Some(Self::Recovery),
            "invite" => Some(Self::Invite),
            "email_change" => Some(Self::EmailChange),
            _ => None,
        }
    }
}

impl SupabaseClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` with "Invalid login credentials" or
    /// "Email not confirmed" when the auth service refuses.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let request = self.request(Method::POST, url, None).json(&json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        }));
        let body = self.send(request).await?;
        parse_body(&body)
    }

    /// Register a new account.
    ///
    /// `redirect_to` is where the confirmation link lands.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` with "User already registered" for a
    /// taken email.
    #[instrument(skip(self, password, metadata), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        metadata: &SignUpMetadata,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let mut url = self.auth_url("signup")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);

        let request = self.request(Method::POST, url, None).json(&json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
            "data": metadata,
        }));
        let body = self.send(request).await?;
        parse_body(&body)
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the request fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &SessionToken) -> Result<(), SupabaseError> {
        let url = self.auth_url("logout")?;
        let request = self.request(Method::POST, url, Some(access_token.expose()));
        self.send(request).await?;
        Ok(())
    }

    /// Look up the user that owns `access_token`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Unauthorized` for an expired or revoked token.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &SessionToken) -> Result<AuthUser, SupabaseError> {
        let url = self.auth_url("user")?;
        let request = self.request(Method::GET, url, Some(access_token.expose()));
        let body = self.send(request).await?;
        parse_body(&body)
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the refresh token was already used or
    /// revoked.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &SessionToken,
    ) -> Result<AuthSession, SupabaseError> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let request = self.request(Method::POST, url, None).json(&json!({
            "refresh_token": refresh_token.expose(),
        }));
        let body = self.send(request).await?;
        parse_body(&body)
    }

    /// Verify the token hash from an email link, signing the user in.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the link is invalid or expired.
    #[instrument(skip(self, token_hash))]
    pub async fn verify_otp(
        &self,
        token_hash: &str,
        kind: OtpType,
    ) -> Result<AuthSession, SupabaseError> {
        let url = self.auth_url("verify")?;
        let request = self.request(Method::POST, url, None).json(&json!({
            "type": kind,
            "token_hash": token_hash,
        }));
        let body = self.send(request).await?;
        parse_body(&body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_debug_is_redacted() {
        let token = SessionToken::new("eyJhbGciOiJIUzI1NiJ9.payload.sig".to_string());
        assert_eq!(format!("{token:?}"), "SessionToken([REDACTED])");
        assert_eq!(token.expose(), "eyJhbGciOiJIUzI1NiJ9.payload.sig");
    }

    #[test]
    fn test_sign_up_outcome_variants() {
        let confirm = r#"{"id":"8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f","email":"a@b.ru"}"#;
        let outcome: SignUpOutcome = serde_json::from_str(confirm).unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));

        let session = r#"{
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "user": {"id":"8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f","email":"a@b.ru"}
        }"#;
        let outcome: SignUpOutcome = serde_json::from_str(session).unwrap();
        let SignUpOutcome::SignedIn(session) = outcome else {
            panic!("expected a session");
        };
        assert_eq!(session.access_token.expose(), "at");
    }

    #[test]
    fn test_expiry_falls_back_to_expires_in() {
        let session: AuthSession = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":3600,
                "user":{"id":"8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f"}}"#,
        )
        .unwrap();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(session.expires_at_or_now_plus(now), 1_700_003_600);
    }

    #[test]
    fn test_otp_type_parse_and_wire_form() {
        assert_eq!(OtpType::parse("signup"), Some(OtpType::Signup));
        assert_eq!(OtpType::parse("bogus"), None);
        assert_eq!(
            serde_json::to_string(&OtpType::EmailChange).unwrap(),
            "\"email_change\""
        );
    }
}
