//! Favorites synchronization with the remote `favorites` table.

use tracing::instrument;

use aqua_dekor_core::ProductId;
use aqua_dekor_core::favorites::{FavoriteWrite, Favorites};

use crate::models::CurrentUser;
use crate::supabase::types::{FavoriteRow, NewFavorite};
use crate::supabase::{Direction, SupabaseClient, SupabaseError, tables};

/// Favorites operations on behalf of one signed-in user.
pub struct FavoritesService<'a> {
    client: &'a SupabaseClient,
    user: &'a CurrentUser,
}

impl<'a> FavoritesService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient, user: &'a CurrentUser) -> Self {
        Self { client, user }
    }

    /// Load the user's favorites in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn load(&self) -> Result<Favorites, SupabaseError> {
        let rows: Vec<FavoriteRow> = self
            .client
            .table(tables::FAVORITES)
            .select(tables::FAVORITE_PRODUCT)
            .eq("user_id", self.user.id)
            .order("created_at", Direction::Asc)
            .auth(Some(&self.user.access_token))
            .fetch()
            .await?;

        Ok(Favorites::new(
            rows.into_iter().filter_map(|row| row.products).collect(),
        ))
    }

    /// Add the product if absent, remove it otherwise.
    ///
    /// Returns the write that was performed.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the product lookup or the remote write
    /// fails; `favorites` is unchanged in that case.
    #[instrument(skip(self, favorites), fields(user_id = %self.user.id))]
    pub async fn toggle(
        &self,
        favorites: &mut Favorites,
        product_id: ProductId,
    ) -> Result<FavoriteWrite, SupabaseError> {
        let write = favorites.plan_toggle(product_id);
        let table = self
            .client
            .table(tables::FAVORITES)
            .auth(Some(&self.user.access_token));

        let product = match write {
            FavoriteWrite::Add(id) => {
                let product = self
                    .client
                    .table(tables::PRODUCTS)
                    .select(tables::PRODUCT_WITH_CATEGORY)
                    .eq("id", id)
                    .fetch_one()
                    .await?;
                table
                    .insert(&NewFavorite {
                        user_id: self.user.id,
                        product_id: id,
                    })
                    .await?;
                Some(product)
            }
            FavoriteWrite::Remove(id) => {
                table
                    .eq("user_id", self.user.id)
                    .eq("product_id", id)
                    .delete()
                    .await?;
                None
            }
        };

        favorites.apply(write, product);
        Ok(write)
    }
}
