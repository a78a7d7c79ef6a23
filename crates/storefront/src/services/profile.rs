//! The signed-in user's own profile row.

use chrono::Utc;
use tracing::instrument;

use crate::models::CurrentUser;
use crate::supabase::types::{Profile, ProfileChange};
use crate::supabase::{SupabaseClient, SupabaseError, tables};

/// Database function returning the caller's `profiles` row.
const CURRENT_PROFILE_FUNCTION: &str = "get_current_profile";

/// Profile form input after trimming; empty fields clear the column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileForm {
    /// Normalize raw form fields.
    ///
    /// # Errors
    ///
    /// Returns the banner text when the avatar URL is not an http(s) URL.
    pub fn parse(display_name: &str, avatar_url: &str) -> Result<Self, &'static str> {
        let non_empty = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        let avatar_url = non_empty(avatar_url);
        if let Some(url) = &avatar_url {
            let valid = url::Url::parse(url)
                .is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
            if !valid {
                return Err("Некорректный адрес изображения");
            }
        }

        Ok(Self {
            display_name: non_empty(display_name),
            avatar_url,
        })
    }
}

pub struct ProfileService<'a> {
    client: &'a SupabaseClient,
    user: &'a CurrentUser,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient, user: &'a CurrentUser) -> Self {
        Self { client, user }
    }

    /// Load the user's profile through the `get_current_profile` database
    /// function, which resolves the caller from the access token.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` if the profile row is missing.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn load(&self) -> Result<Profile, SupabaseError> {
        let profile: Option<Profile> = self
            .client
            .rpc(
                CURRENT_PROFILE_FUNCTION,
                &serde_json::json!({}),
                Some(&self.user.access_token),
            )
            .await?;
        profile.ok_or_else(|| SupabaseError::NotFound(tables::PROFILES.to_string()))
    }

    /// Save display name and avatar URL.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the update fails.
    #[instrument(skip(self, form), fields(user_id = %self.user.id))]
    pub async fn update(&self, form: ProfileForm) -> Result<(), SupabaseError> {
        self.client
            .table(tables::PROFILES)
            .eq("id", self.user.id)
            .auth(Some(&self.user.access_token))
            .update(&ProfileChange {
                display_name: form.display_name,
                avatar_url: form.avatar_url,
                updated_at: Utc::now(),
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_form_trims_and_clears() {
        let form = ProfileForm::parse("  Ольга ", "").unwrap();
        assert_eq!(form.display_name.as_deref(), Some("Ольга"));
        assert!(form.avatar_url.is_none());
    }

    #[test]
    fn test_profile_form_rejects_bad_avatar_url() {
        assert!(ProfileForm::parse("", "javascript:alert(1)").is_err());
        assert!(ProfileForm::parse("", "https://cdn.example.com/a.png").is_ok());
    }
}
