//! Session-related types.
//!
//! Types stored in the server-side session: the signed-in user with the
//! tokens needed to act on their behalf, and a one-shot banner message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aqua_dekor_core::{Email, UserId};

use crate::supabase::{AuthSession, SessionToken};

/// Refresh the access token this many seconds before it expires.
pub const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Session-stored user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth-service user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Bearer for row-level-secured calls.
    pub access_token: SessionToken,
    /// Exchanged for a new access token when it expires.
    pub refresh_token: SessionToken,
    /// Unix timestamp (seconds) when `access_token` expires.
    pub expires_at: i64,
    /// Last seen `profiles.is_admin`; admin routes re-check it.
    pub is_admin: bool,
}

impl CurrentUser {
    /// Build the session identity from a fresh auth session.
    ///
    /// Returns `None` when the auth service did not report an email.
    #[must_use]
    pub fn from_auth(session: &AuthSession, is_admin: bool, now: DateTime<Utc>) -> Option<Self> {
        let email = Email::parse(session.user.email.as_deref()?).ok()?;
        Some(Self {
            id: session.user.id,
            email,
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at_or_now_plus(now),
            is_admin,
        })
    }

    /// Whether the access token expires within the refresh margin.
    #[must_use]
    pub const fn needs_refresh(&self, now: i64) -> bool {
        self.expires_at - REFRESH_MARGIN_SECONDS <= now
    }

    /// Replace the tokens with those of a refreshed session.
    pub fn apply_refresh(&mut self, session: &AuthSession, now: DateTime<Utc>) {
        self.access_token = session.access_token.clone();
        self.refresh_token = session.refresh_token.clone();
        self.expires_at = session.expires_at_or_now_plus(now);
    }

    /// Header greeting: the part of the email before `@`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.email.local_part()
    }
}

/// Banner severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Error,
    Success,
}

/// One-shot message shown in the fixed-position banner on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    /// CSS class for the banner.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Error => "banner banner-error",
            FlashKind::Success => "banner banner-success",
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the pending banner message.
    pub const FLASH: &str = "flash";
}
