//! Cart synchronization with the remote `cart_items` table.
//!
//! Every action follows the same order: decide the write with
//! [`Cart`]'s planning methods, perform it remotely, and only then apply it
//! to the in-memory cart. A failed remote write leaves the cart untouched.

use tracing::instrument;

use aqua_dekor_core::ProductId;
use aqua_dekor_core::cart::{Cart, CartLine, CartWrite};
use aqua_dekor_core::catalog::Product;

use crate::models::CurrentUser;
use crate::supabase::types::{CartItemRow, NewCartItem, QuantityChange};
use crate::supabase::{Direction, SupabaseClient, SupabaseError, tables};

/// Cart operations on behalf of one signed-in user.
pub struct CartService<'a> {
    client: &'a SupabaseClient,
    user: &'a CurrentUser,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient, user: &'a CurrentUser) -> Self {
        Self { client, user }
    }

    /// Load the user's cart, oldest line first.
    ///
    /// Rows whose product is no longer visible are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn load(&self) -> Result<Cart, SupabaseError> {
        let rows: Vec<CartItemRow> = self
            .client
            .table(tables::CART_ITEMS)
            .select(tables::CART_LINE)
            .eq("user_id", self.user.id)
            .order("created_at", Direction::Asc)
            .auth(Some(&self.user.access_token))
            .fetch()
            .await?;

        Ok(Cart::new(
            rows.into_iter()
                .filter_map(|row| {
                    row.products.map(|product| CartLine {
                        product,
                        quantity: row.quantity,
                    })
                })
                .collect(),
        ))
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` if the product does not exist, or
    /// any error from the remote write.
    #[instrument(skip(self, cart), fields(user_id = %self.user.id))]
    pub async fn add(&self, cart: &mut Cart, product_id: ProductId) -> Result<(), SupabaseError> {
        let write = cart.plan_add(product_id);
        let product = match write {
            CartWrite::Insert { .. } => Some(self.product(product_id).await?),
            _ => None,
        };
        self.write(write).await?;
        cart.apply(write, product);
        Ok(())
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the remote write fails.
    #[instrument(skip(self, cart), fields(user_id = %self.user.id))]
    pub async fn set_quantity(
        &self,
        cart: &mut Cart,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), SupabaseError> {
        let write = Cart::plan_set_quantity(product_id, quantity);
        self.write(write).await?;
        cart.apply(write, None);
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the remote delete fails.
    #[instrument(skip(self, cart), fields(user_id = %self.user.id))]
    pub async fn remove(&self, cart: &mut Cart, product_id: ProductId) -> Result<(), SupabaseError> {
        let write = Cart::plan_remove(product_id);
        self.write(write).await?;
        cart.apply(write, None);
        Ok(())
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, SupabaseError> {
        self.client
            .table(tables::PRODUCTS)
            .select(tables::PRODUCT_WITH_CATEGORY)
            .eq("id", product_id)
            .fetch_one()
            .await
    }

    async fn write(&self, write: CartWrite) -> Result<(), SupabaseError> {
        let table = || {
            self.client
                .table(tables::CART_ITEMS)
                .auth(Some(&self.user.access_token))
        };

        match write {
            CartWrite::Insert {
                product_id,
                quantity,
            } => {
                table()
                    .insert(&NewCartItem {
                        user_id: self.user.id,
                        product_id,
                        quantity,
                    })
                    .await
            }
            CartWrite::Update {
                product_id,
                quantity,
            } => {
                table()
                    .eq("user_id", self.user.id)
                    .eq("product_id", product_id)
                    .update(&QuantityChange { quantity })
                    .await
            }
            CartWrite::Delete { product_id } => {
                table()
                    .eq("user_id", self.user.id)
                    .eq("product_id", product_id)
                    .delete()
                    .await
            }
        }
    }
}
