//! Seed the catalog (categories and products) from a YAML file.
//!
//! Categories are matched by slug: existing ones are reused, missing ones
//! are inserted first so products can reference them.
//!
//! ```yaml
//! categories:
//!   - name: Смесители
//!     slug: smesiteli
//! products:
//!   - name: Смеситель для ванны Grohe Eurosmart
//!     price: 12990
//!     old_price: 15990
//!     inventory: 12
//!     category: smesiteli
//!     is_bestseller: true
//!     specifications:
//!       Производитель: Grohe
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use aqua_dekor_core::{CategoryId, Price};
use aqua_dekor_core::catalog::Category;
use aqua_dekor_storefront::services::{AdminService, CatalogService};
use aqua_dekor_storefront::supabase::types::{NewCategory, ProductInput};

/// Errors in a seed file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("Product '{product}' references unknown category '{slug}'")]
    UnknownCategory { product: String, slug: String },

    #[error("Duplicate category slug '{0}'")]
    DuplicateCategory(String),

    #[error("Product '{0}' has a negative inventory")]
    NegativeInventory(String),

    #[error("Product name must not be empty")]
    EmptyName,
}

/// Seed file contents.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    pub categories: Vec<NewCategory>,
    pub products: Vec<SeedProduct>,
}

/// One product in a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub old_price: Option<Price>,
    #[serde(default)]
    pub inventory: i32,
    /// Category slug.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub specifications: Map<String, Value>,
}

impl CatalogSeed {
    /// Seed categories whose slug is not stored yet.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::DuplicateCategory` if the file lists a slug twice.
    pub fn missing_categories(&self, existing: &[Category]) -> Result<Vec<NewCategory>, SeedError> {
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.slug.as_str()) {
                return Err(SeedError::DuplicateCategory(category.slug.clone()));
            }
        }

        Ok(self
            .categories
            .iter()
            .filter(|c| !existing.iter().any(|e| e.slug == c.slug))
            .cloned()
            .collect())
    }

    /// Product payloads with category slugs resolved against `categories`.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` for unknown slugs, empty names or negative
    /// inventory.
    pub fn product_inputs(
        &self,
        categories: &[Category],
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductInput>, SeedError> {
        self.products
            .iter()
            .map(|product| product.to_input(categories, now))
            .collect()
    }
}

impl SeedProduct {
    fn to_input(
        &self,
        categories: &[Category],
        now: DateTime<Utc>,
    ) -> Result<ProductInput, SeedError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SeedError::EmptyName);
        }
        if self.inventory < 0 {
            return Err(SeedError::NegativeInventory(name.to_string()));
        }

        let category_id = match self.category.as_deref() {
            None => None,
            Some(slug) => Some(
                categories
                    .iter()
                    .find(|c| c.slug == slug)
                    .map(|c| c.id)
                    .ok_or_else(|| SeedError::UnknownCategory {
                        product: name.to_string(),
                        slug: slug.to_string(),
                    })?,
            ),
        };

        Ok(ProductInput {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            old_price: self.old_price,
            inventory: self.inventory,
            category_id,
            image_url: self.image_url.clone(),
            featured: self.featured,
            is_new: self.is_new,
            is_bestseller: self.is_bestseller,
            specifications: self.specifications.clone(),
            updated_at: now,
        })
    }
}

/// Seed categories and products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, references an
/// unknown category, or a backend write fails.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let client = super::service_client()?;
    let catalog = CatalogService::new(&client);
    let admin = AdminService::new(&client, None);

    let mut categories = catalog.categories().await?;
    let missing = seed.missing_categories(&categories)?;

    if dry_run {
        let mut all = categories.clone();
        all.extend(missing.iter().enumerate().map(|(i, c)| placeholder(i, c)));
        let products = seed.product_inputs(&all, Utc::now())?;
        info!(
            new_categories = missing.len(),
            products = products.len(),
            "Dry run: seed file is valid, nothing written"
        );
        return Ok(());
    }

    if missing.is_empty() {
        info!("All categories already exist");
    } else {
        let created = admin.create_categories(&missing).await?;
        info!(count = created.len(), "Inserted categories");
        categories.extend(created);
    }

    let products = seed.product_inputs(&categories, Utc::now())?;
    if products.is_empty() {
        warn!("Seed file has no products");
        return Ok(());
    }
    admin.create_products(&products).await?;
    info!(count = products.len(), "Inserted products");

    Ok(())
}

/// Stand-in for a category that a dry run would insert.
fn placeholder(index: usize, category: &NewCategory) -> Category {
    let id = i64::try_from(index).map_or(-1, |i| -1 - i);
    Category {
        id: CategoryId::new(id),
        name: category.name.clone(),
        slug: category.slug.clone(),
        description: category.description.clone(),
        image_url: None,
        created_at: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SEED: &str = r"
categories:
  - name: Смесители
    slug: smesiteli
  - name: Ванны
    slug: vanny
products:
  - name: Смеситель для ванны Grohe Eurosmart
    description: Современный смеситель с керамическим картриджем.
    price: 12990
    old_price: 15990
    inventory: 12
    category: smesiteli
    is_bestseller: true
    specifications:
      Производитель: Grohe
      Гарантия: 5 лет
  - name: Набор полотенец
    price: 1490
";

    fn stored(id: i64, slug: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            image_url: None,
            created_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_parse_seed_file() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.categories.len(), 2);
        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[0].price, Price::from_rubles(12_990));
        assert_eq!(seed.products[1].inventory, 0);
        assert!(seed.products[1].category.is_none());
    }

    #[test]
    fn test_missing_categories_skips_stored_slugs() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        let missing = seed.missing_categories(&[stored(4, "smesiteli")]).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].slug, "vanny");
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let seed: CatalogSeed =
            serde_yaml::from_str("categories:\n  - {name: A, slug: a}\n  - {name: B, slug: a}\n")
                .unwrap();
        assert_eq!(
            seed.missing_categories(&[]),
            Err(SeedError::DuplicateCategory("a".to_string()))
        );
    }

    #[test]
    fn test_product_inputs_resolve_category_ids() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        let inputs = seed
            .product_inputs(&[stored(4, "smesiteli"), stored(2, "vanny")], now())
            .unwrap();

        assert_eq!(inputs[0].category_id, Some(CategoryId::new(4)));
        assert_eq!(inputs[0].old_price, Some(Price::from_rubles(15_990)));
        assert_eq!(inputs[0].specifications["Производитель"], "Grohe");
        assert!(inputs[0].is_bestseller);
        assert_eq!(inputs[1].category_id, None);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        let err = seed.product_inputs(&[stored(2, "vanny")], now()).unwrap_err();
        assert_eq!(
            err,
            SeedError::UnknownCategory {
                product: "Смеситель для ванны Grohe Eurosmart".to_string(),
                slug: "smesiteli".to_string(),
            }
        );
    }

    #[test]
    fn test_bundled_seed_file_is_valid() {
        let seed: CatalogSeed =
            serde_yaml::from_str(include_str!("../../seed/catalog.yaml")).unwrap();
        let missing = seed.missing_categories(&[]).unwrap();
        assert_eq!(missing.len(), seed.categories.len());

        let categories: Vec<Category> = missing
            .iter()
            .enumerate()
            .map(|(i, c)| placeholder(i, c))
            .collect();
        let inputs = seed.product_inputs(&categories, now()).unwrap();
        assert_eq!(inputs.len(), seed.products.len());
        assert!(inputs.iter().all(|p| p.category_id.is_some()));
    }

    #[test]
    fn test_placeholder_ids_are_negative() {
        let category = NewCategory {
            name: "Ванны".to_string(),
            slug: "vanny".to_string(),
            description: None,
        };
        assert_eq!(placeholder(0, &category).id, CategoryId::new(-1));
        assert_eq!(placeholder(2, &category).id, CategoryId::new(-3));
    }
}
