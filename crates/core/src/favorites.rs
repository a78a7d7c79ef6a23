//! Favorites ("избранное") bookkeeping.
//!
//! Favorites are a set of products per user. The heart button toggles
//! membership: a favorited product is removed, anything else is added.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::ProductId;

/// The remote write implied by a favorite toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteWrite {
    Add(ProductId),
    Remove(ProductId),
}

/// A user's favorite products, most recently added last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Favorites {
    products: Vec<Product>,
}

impl Favorites {
    /// Build from fetched products, dropping repeated IDs.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        let mut favorites = Self::default();
        for product in products {
            if !favorites.contains(product.id) {
                favorites.products.push(product);
            }
        }
        favorites
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// IDs in list order, for marking hearts on product cards.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.products.iter().map(|p| p.id).collect()
    }

    #[must_use]
    pub fn plan_toggle(&self, product_id: ProductId) -> FavoriteWrite {
        if self.contains(product_id) {
            FavoriteWrite::Remove(product_id)
        } else {
            FavoriteWrite::Add(product_id)
        }
    }

    /// Apply a write the remote side accepted. Adding needs the product.
    pub fn apply(&mut self, write: FavoriteWrite, product: Option<Product>) {
        match write {
            FavoriteWrite::Add(id) => {
                if let Some(product) = product.filter(|p| p.id == id && !self.contains(id)) {
                    self.products.push(product);
                }
            }
            FavoriteWrite::Remove(id) => self.products.retain(|p| p.id != id),
        }
    }
}
