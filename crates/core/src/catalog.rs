//! Catalog records and the list operations behind the home page.
//!
//! Products arrive from the `products` table newest first. The home page
//! narrows them to the category picked in the sidebar, reorders them by the
//! sort selector, and highlights up to four best sellers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{CategoryId, Price, ProductId};

/// Maximum number of best sellers shown on the home page.
pub const BEST_SELLERS_LIMIT: usize = 4;

/// A product row, optionally with its embedded category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub old_price: Option<Price>,
    #[serde(default)]
    pub inventory: i32,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_bestseller: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub specifications: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded via `select=*,categories(...)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryRef>,
}

impl Product {
    /// Slug of the embedded category, if the query embedded one.
    #[must_use]
    pub fn category_slug(&self) -> Option<&str> {
        self.categories.as_ref().map(|c| c.slug.as_str())
    }

    /// Whole-percent discount against `old_price`.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.old_price
            .and_then(|old| self.price.discount_percent(old))
    }

    /// Whether any units are available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory > 0
    }

    /// Specification rows as display strings, in stored key order.
    #[must_use]
    pub fn specification_rows(&self) -> Vec<(String, String)> {
        self.specifications
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    }
}

/// The category fields embedded into product rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(default)]
    pub id: Option<CategoryId>,
    #[serde(default)]
    pub name: Option<String>,
    pub slug: String,
}

/// A category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Sort orders offered by the catalog's sort selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Keep the remote order (newest first).
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    /// Highest rating first.
    Rating,
    /// New arrivals first, otherwise remote order.
    New,
}

impl ProductSort {
    /// Every option, in selector order.
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Rating,
        Self::New,
    ];

    /// Parse the selector value. Unknown or missing values fall back to
    /// [`ProductSort::Default`].
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price-asc") => Self::PriceAsc,
            Some("price-desc") => Self::PriceDesc,
            Some("rating") => Self::Rating,
            Some("new") => Self::New,
            _ => Self::Default,
        }
    }

    /// Selector value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Rating => "rating",
            Self::New => "new",
        }
    }

    /// Selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "По умолчанию",
            Self::PriceAsc => "Цена (по возрастанию)",
            Self::PriceDesc => "Цена (по убыванию)",
            Self::Rating => "По рейтингу",
            Self::New => "Сначала новинки",
        }
    }
}

/// Products in the category with the given slug.
///
/// `None` or an empty slug means "show all".
#[must_use]
pub fn filter_by_category(products: &[Product], slug: Option<&str>) -> Vec<Product> {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        None => products.to_vec(),
        Some(slug) => products
            .iter()
            .filter(|p| p.category_slug() == Some(slug))
            .cloned()
            .collect(),
    }
}

/// Reorder products in place. All orders are stable.
pub fn sort_products(products: &mut [Product], sort: ProductSort) {
    match sort {
        ProductSort::Default => {}
        ProductSort::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
        ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
        ProductSort::Rating => products.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        ProductSort::New => products.sort_by_key(|p| !p.is_new),
    }
}

/// Up to `limit` products flagged as best sellers, in input order.
#[must_use]
pub fn best_sellers(products: &[Product], limit: usize) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.is_bestseller)
        .take(limit)
        .cloned()
        .collect()
}

/// The featured "product of the day": the first best seller.
#[must_use]
pub fn product_of_the_day(best_sellers: &[Product]) -> Option<&Product> {
    best_sellers.first()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn product(id: i64, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Товар {id}"),
            description: String::new(),
            price: Price::from_rubles(price),
            old_price: None,
            inventory: 10,
            category_id: None,
            image_url: None,
            featured: false,
            is_new: false,
            is_bestseller: false,
            rating: 0.0,
            specifications: Map::new(),
            created_at: None,
            updated_at: None,
            categories: None,
        }
    }

    fn in_category(mut p: Product, slug: &str) -> Product {
        p.categories = Some(CategoryRef {
            id: None,
            name: None,
            slug: slug.to_string(),
        });
        p
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    #[test]
    fn test_filter_by_category() {
        let products = vec![
            in_category(product(1, 100), "vanny"),
            in_category(product(2, 200), "smesiteli"),
            product(3, 300),
            in_category(product(4, 400), "vanny"),
        ];

        assert_eq!(ids(&filter_by_category(&products, Some("vanny"))), [1, 4]);
        assert_eq!(ids(&filter_by_category(&products, None)), [1, 2, 3, 4]);
        assert_eq!(ids(&filter_by_category(&products, Some(""))), [1, 2, 3, 4]);
        assert!(filter_by_category(&products, Some("unitazy")).is_empty());
    }

    #[test]
    fn test_sort_by_price() {
        let mut products = vec![product(1, 300), product(2, 100), product(3, 200)];
        sort_products(&mut products, ProductSort::PriceAsc);
        assert_eq!(ids(&products), [2, 3, 1]);
        sort_products(&mut products, ProductSort::PriceDesc);
        assert_eq!(ids(&products), [1, 3, 2]);
    }

    #[test]
    fn test_sort_by_rating_and_new() {
        let mut products = vec![product(1, 1), product(2, 1), product(3, 1)];
        products[0].rating = 4.1;
        products[1].rating = 4.9;
        products[2].rating = 4.5;
        products[2].is_new = true;

        let mut by_rating = products.clone();
        sort_products(&mut by_rating, ProductSort::Rating);
        assert_eq!(ids(&by_rating), [2, 3, 1]);

        let mut by_new = products.clone();
        sort_products(&mut by_new, ProductSort::New);
        assert_eq!(ids(&by_new), [3, 1, 2]);

        sort_products(&mut products, ProductSort::Default);
        assert_eq!(ids(&products), [1, 2, 3]);
    }

    #[test]
    fn test_sort_parse_falls_back_to_default() {
        assert_eq!(ProductSort::parse(Some("price-asc")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::parse(Some("cheapest")), ProductSort::Default);
        assert_eq!(ProductSort::parse(None), ProductSort::Default);
        for sort in ProductSort::ALL {
            assert_eq!(ProductSort::parse(Some(sort.as_str())), sort);
        }
    }

    #[test]
    fn test_best_sellers_limit_and_product_of_the_day() {
        let products: Vec<Product> = (1..=6)
            .map(|id| {
                let mut p = product(id, 100);
                p.is_bestseller = id != 2;
                p
            })
            .collect();

        let best = best_sellers(&products, BEST_SELLERS_LIMIT);
        assert_eq!(ids(&best), [1, 3, 4, 5]);
        assert_eq!(product_of_the_day(&best).unwrap().id, ProductId::new(1));
        assert!(product_of_the_day(&[]).is_none());
    }

    #[test]
    fn test_product_row_deserializes_with_embedded_category() {
        let json = r#"{
            "id": 1,
            "name": "Смеситель Grohe Eurosmart",
            "description": "Однорычажный смеситель",
            "price": 12990,
            "old_price": 15990,
            "inventory": 3,
            "category_id": 4,
            "image_url": null,
            "featured": false,
            "is_new": false,
            "is_bestseller": true,
            "rating": 4.5,
            "specifications": {"Производитель": "Grohe", "Гарантия, лет": 5},
            "created_at": "2025-03-01T10:00:00+00:00",
            "updated_at": "2025-03-01T10:00:00+00:00",
            "categories": {"slug": "smesiteli"}
        }"#;

        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.category_slug(), Some("smesiteli"));
        assert_eq!(p.discount_percent(), Some(19));
        assert!(p.in_stock());
        assert_eq!(
            p.specification_rows(),
            vec![
                ("Производитель".to_string(), "Grohe".to_string()),
                ("Гарантия, лет".to_string(), "5".to_string()),
            ]
        );
    }
}
