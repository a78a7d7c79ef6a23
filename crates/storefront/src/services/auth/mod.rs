//! Authentication service.
//!
//! Wraps the auth API calls with the storefront's validation rules and
//! produces the [`CurrentUser`] stored in the session.

mod error;

pub use error::AuthError;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use aqua_dekor_core::{Email, UserId};

use crate::models::CurrentUser;
use crate::supabase::types::EmailVerifiedChange;
use crate::supabase::{
    AuthSession, OtpType, SessionToken, SignUpMetadata, SignUpOutcome, SupabaseClient,
    SupabaseError, tables,
};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Path the confirmation email links back to.
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Registration form input.
#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
    pub first_name: String,
    pub last_name: String,
}

/// What happened after a successful registration.
#[derive(Debug)]
pub enum Registered {
    /// The user is signed in right away.
    SignedIn(CurrentUser),
    /// A confirmation link was sent to this address.
    ConfirmationSent(Email),
}

#[derive(Deserialize)]
struct AdminFlagRow {
    #[serde(default)]
    is_admin: bool,
}

/// Authentication service.
pub struct AuthService<'a> {
    client: &'a SupabaseClient,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and
    /// `AuthError::Supabase` when the credentials are refused.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email.trim())?;
        let session = self.client.sign_in_with_password(&email, password).await?;
        self.current_user(&session).await
    }

    /// Sign in to the admin area.
    ///
    /// A valid account without the admin flag is signed out again remotely.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAdmin` for non-administrators, or any error
    /// from [`Self::sign_in`].
    #[instrument(skip(self, password))]
    pub async fn admin_sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, AuthError> {
        let user = self.sign_in(email, password).await?;
        if user.is_admin {
            return Ok(user);
        }

        tracing::warn!(user_id = %user.id, "Admin sign-in refused for non-admin");
        if let Err(e) = self.client.sign_out(&user.access_token).await {
            tracing::warn!("Failed to revoke non-admin session: {e}");
        }
        Err(AuthError::NotAdmin)
    }

    /// Revoke the user's session. Failures are logged, not returned: the
    /// local session is cleared either way.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, user: &CurrentUser) {
        if let Err(e) = self.client.sign_out(&user.access_token).await {
            tracing::warn!(user_id = %user.id, "Remote sign-out failed: {e}");
        }
    }

    /// Register a new account.
    ///
    /// `redirect_to` is the absolute URL of [`CALLBACK_PATH`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch`, `AuthError::WeakPassword` or
    /// `AuthError::InvalidEmail` before any remote call, and
    /// `AuthError::Supabase` when the backend refuses.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn sign_up(
        &self,
        form: &Registration,
        redirect_to: &str,
    ) -> Result<Registered, AuthError> {
        validate_passwords(&form.password, &form.password_confirm)?;
        let email = Email::parse(form.email.trim())?;
        let metadata = SignUpMetadata {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
        };

        match self
            .client
            .sign_up(&email, &form.password, &metadata, redirect_to)
            .await?
        {
            SignUpOutcome::SignedIn(session) => {
                Ok(Registered::SignedIn(self.current_user(&session).await?))
            }
            SignUpOutcome::ConfirmationRequired(_) => Ok(Registered::ConfirmationSent(email)),
        }
    }

    /// Handle the link from the confirmation email: verify the token,
    /// mark the profile's email as verified and sign the user in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidLink` for a missing token or unknown type,
    /// and `AuthError::Supabase` if verification fails.
    #[instrument(skip(self, token_hash))]
    pub async fn confirm_email(
        &self,
        token_hash: Option<&str>,
        kind: Option<&str>,
    ) -> Result<CurrentUser, AuthError> {
        let token_hash = token_hash
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidLink)?;
        let kind = kind
            .map_or(Some(OtpType::Signup), OtpType::parse)
            .ok_or(AuthError::InvalidLink)?;

        let session = self.client.verify_otp(token_hash, kind).await?;

        self.client
            .table(tables::PROFILES)
            .eq("id", session.user.id)
            .auth(Some(&session.access_token))
            .update(&EmailVerifiedChange {
                email_verified: true,
            })
            .await?;

        self.current_user(&session).await
    }

    /// Whether the profile carries the admin flag. A missing profile is
    /// not an admin.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the lookup fails.
    pub async fn is_admin(
        &self,
        user_id: UserId,
        token: &SessionToken,
    ) -> Result<bool, SupabaseError> {
        let row: Option<AdminFlagRow> = self
            .client
            .table(tables::PROFILES)
            .select("is_admin")
            .eq("id", user_id)
            .auth(Some(token))
            .fetch_optional()
            .await?;
        Ok(row.is_some_and(|r| r.is_admin))
    }

    async fn current_user(&self, session: &AuthSession) -> Result<CurrentUser, AuthError> {
        let is_admin = self
            .is_admin(session.user.id, &session.access_token)
            .await?;
        CurrentUser::from_auth(session, is_admin, Utc::now()).ok_or(AuthError::MissingEmail)
    }
}

/// Check the password rules that apply before any remote call.
///
/// # Errors
///
/// Returns `AuthError::PasswordMismatch` or `AuthError::WeakPassword`.
pub fn validate_passwords(
    password: &SecretString,
    confirm: &SecretString,
) -> Result<(), AuthError> {
    let password = password.expose_secret();
    if password != confirm.expose_secret() {
        return Err(AuthError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_password_rules() {
        assert!(matches!(
            validate_passwords(&secret("abcdef"), &secret("abcdeg")),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            validate_passwords(&secret("abc"), &secret("abc")),
            Err(AuthError::WeakPassword)
        ));
        assert!(validate_passwords(&secret("пароль"), &secret("пароль")).is_ok());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthError::PasswordMismatch.user_message(), "Пароли не совпадают");
        assert_eq!(
            AuthError::WeakPassword.user_message(),
            "Пароль должен содержать минимум 6 символов"
        );
    }
}
