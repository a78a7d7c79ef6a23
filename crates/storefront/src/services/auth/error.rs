//! Authentication error types.

use thiserror::Error;

use aqua_dekor_core::EmailError;

use crate::supabase::SupabaseError;

/// Errors that can occur during sign-in, sign-up and email confirmation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password shorter than the minimum.
    #[error("password too short")]
    WeakPassword,

    /// Signed in, but the profile is not an administrator.
    #[error("not an administrator")]
    NotAdmin,

    /// The auth service returned a session without an email.
    #[error("session has no email")]
    MissingEmail,

    /// The email link lacks its token or has an unknown type.
    #[error("invalid confirmation link")]
    InvalidLink,

    /// The backend rejected the request.
    #[error(transparent)]
    Supabase(#[from] SupabaseError),
}

impl AuthError {
    /// Banner text for the login and registration pages.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Некорректный email".to_string(),
            Self::PasswordMismatch => "Пароли не совпадают".to_string(),
            Self::WeakPassword => "Пароль должен содержать минимум 6 символов".to_string(),
            Self::NotAdmin => "Доступ запрещен. У вас нет прав администратора.".to_string(),
            Self::MissingEmail => "Ошибка входа: сессия не создана".to_string(),
            Self::InvalidLink => "Ссылка подтверждения недействительна или устарела".to_string(),
            Self::Supabase(err) => err.user_message(),
        }
    }
}
