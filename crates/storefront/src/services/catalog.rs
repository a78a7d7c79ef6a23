//! Public catalog reads: products, categories and reviews.

use tracing::instrument;

use aqua_dekor_core::ProductId;
use aqua_dekor_core::catalog::{self, BEST_SELLERS_LIMIT, Category, Product};

use crate::supabase::types::Review;
use crate::supabase::{Direction, SupabaseClient, SupabaseError, tables};

/// Read-only catalog queries, run with the anonymous key.
pub struct CatalogService<'a> {
    client: &'a SupabaseClient,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(client: &'a SupabaseClient) -> Self {
        Self { client }
    }

    /// Every product, newest first, with its category embedded.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, SupabaseError> {
        self.client
            .table(tables::PRODUCTS)
            .select(tables::PRODUCT_WITH_CATEGORY)
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// Products flagged as best sellers, at most [`BEST_SELLERS_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn best_sellers(&self) -> Result<Vec<Product>, SupabaseError> {
        let rows: Vec<Product> = self
            .client
            .table(tables::PRODUCTS)
            .select(tables::PRODUCT_WITH_CATEGORY)
            .eq("is_bestseller", true)
            .order("created_at", Direction::Desc)
            .limit(BEST_SELLERS_LIMIT)
            .fetch()
            .await?;
        Ok(catalog::best_sellers(&rows, BEST_SELLERS_LIMIT))
    }

    /// Categories for the sidebar, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, SupabaseError> {
        self.client
            .table(tables::CATEGORIES)
            .select("*")
            .order("name", Direction::Asc)
            .fetch()
            .await
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` when no product has this id.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Product, SupabaseError> {
        self.client
            .table(tables::PRODUCTS)
            .select(tables::PRODUCT_WITH_CATEGORY)
            .eq("id", id)
            .fetch_one()
            .await
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn reviews(&self, product_id: ProductId) -> Result<Vec<Review>, SupabaseError> {
        self.client
            .table(tables::REVIEWS)
            .select(tables::REVIEW_WITH_AUTHOR)
            .eq("product_id", product_id)
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }
}
