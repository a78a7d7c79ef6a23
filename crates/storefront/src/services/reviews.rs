//! Writing, editing and deleting one's own product reviews.
//!
//! Every write is filtered by the author's id as well as the review id, so
//! a forged review id can only ever touch the caller's own rows.

use tracing::instrument;

use aqua_dekor_core::{ProductId, Rating, ReviewId};

use crate::models::CurrentUser;
use crate::supabase::types::{NewReview, ReviewChange};
use crate::supabase::{SupabaseClient, SupabaseError, tables};

/// Longest accepted review text, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// Review writes on behalf of one signed-in user.
pub struct ReviewService<'a> {
    client: &'a SupabaseClient,
    user: &'a CurrentUser,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient, user: &'a CurrentUser) -> Self {
        Self { client, user }
    }

    /// Post a review.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the backend rejects the insert.
    #[instrument(skip(self, comment), fields(user_id = %self.user.id))]
    pub async fn create(
        &self,
        product_id: ProductId,
        rating: Rating,
        comment: &str,
    ) -> Result<(), SupabaseError> {
        self.client
            .table(tables::REVIEWS)
            .auth(Some(&self.user.access_token))
            .insert(&NewReview {
                product_id,
                user_id: self.user.id,
                rating,
                comment: clean_comment(comment),
            })
            .await
    }

    /// Edit one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the update fails.
    #[instrument(skip(self, comment), fields(user_id = %self.user.id))]
    pub async fn update(
        &self,
        id: ReviewId,
        rating: Rating,
        comment: &str,
    ) -> Result<(), SupabaseError> {
        self.client
            .table(tables::REVIEWS)
            .eq("id", id)
            .eq("user_id", self.user.id)
            .auth(Some(&self.user.access_token))
            .update(&ReviewChange {
                rating,
                comment: clean_comment(comment),
            })
            .await
    }

    /// Delete one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the delete fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn delete(&self, id: ReviewId) -> Result<(), SupabaseError> {
        self.client
            .table(tables::REVIEWS)
            .eq("id", id)
            .eq("user_id", self.user.id)
            .auth(Some(&self.user.access_token))
            .delete()
            .await
    }
}

/// Trim and cap the comment.
fn clean_comment(comment: &str) -> String {
    comment.trim().chars().take(MAX_COMMENT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_comment() {
        assert_eq!(clean_comment("  Хороший душ \n"), "Хороший душ");
        assert_eq!(
            clean_comment(&"я".repeat(MAX_COMMENT_CHARS + 10))
                .chars()
                .count(),
            MAX_COMMENT_CHARS
        );
    }
}
