//! Row and payload types for the remote tables.
//!
//! Catalog records (`Product`, `Category`) live in `aqua_dekor_core::catalog`
//! because the list logic works on them; everything else the storefront
//! reads or writes is defined here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use aqua_dekor_core::catalog::Product;
use aqua_dekor_core::{
    ArticleId, CategoryId, OrderId, OrderStatus, Price, ProductId, Rating, ReviewId, UserId,
};

// =============================================================================
// Cart & Favorites
// =============================================================================

/// A `cart_items` row with its product embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRow {
    pub quantity: u32,
    /// `None` when the product was deleted or hidden by row-level security.
    #[serde(default)]
    pub products: Option<Product>,
}

/// Insert payload for `cart_items`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Update payload for `cart_items`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuantityChange {
    pub quantity: u32,
}

/// A `favorites` row with its product embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteRow {
    pub product_id: ProductId,
    #[serde(default)]
    pub products: Option<Product>,
}

/// Insert payload for `favorites`.
#[derive(Debug, Clone, Serialize)]
pub struct NewFavorite {
    pub user_id: UserId,
    pub product_id: ProductId,
}

// =============================================================================
// Reviews
// =============================================================================

/// Public profile fields embedded into reviews and articles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthorProfile {
    /// Name to show next to a review or article.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("Пользователь")
    }
}

/// A `reviews` row.
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profiles: Option<AuthorProfile>,
}

impl Review {
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.profiles
            .as_ref()
            .map_or("Пользователь", AuthorProfile::name)
    }
}

/// Insert payload for `reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: Rating,
    pub comment: String,
}

/// Update payload for `reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewChange {
    pub rating: Rating,
    pub comment: String,
}

// =============================================================================
// Articles
// =============================================================================

/// An `articles` row.
#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author: Option<AuthorProfile>,
}

/// Insert/update payload for `articles`, as submitted by the admin form.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleInput {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    pub updated_at: DateTime<Utc>,
}

/// Update payload toggling publication.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PublishChange {
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Products (admin writes)
// =============================================================================

/// Insert payload for `categories` (seeding).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Insert/update payload for `products`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub old_price: Option<Price>,
    pub inventory: i32,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub is_new: bool,
    pub is_bestseller: bool,
    pub specifications: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl ProductInput {
    /// Payload that rewrites a product with its current values.
    #[must_use]
    pub fn from_product(product: &Product, now: DateTime<Utc>) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            old_price: product.old_price,
            inventory: product.inventory,
            category_id: product.category_id,
            image_url: product.image_url.clone(),
            featured: product.featured,
            is_new: product.is_new,
            is_bestseller: product.is_bestseller,
            specifications: product.specifications.clone(),
            updated_at: now,
        }
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// A `profiles` row. The id is the auth user's id.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Display name, falling back to username, then the email's local part.
    #[must_use]
    pub fn shown_name(&self) -> String {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(str::to_string)
            })
            .unwrap_or_default()
    }
}

/// Profile page update payload.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileChange {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Admin flag update payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminFlagChange {
    pub is_admin: bool,
}

/// Email-confirmation update payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EmailVerifiedChange {
    pub email_verified: bool,
}

// =============================================================================
// Orders
// =============================================================================

/// Shipping details stored on an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

/// Customer fields embedded into orders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderCustomer {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// An `orders` row.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profiles: Option<OrderCustomer>,
}

/// Order status update payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrderStatusChange {
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_review_row_with_author() {
        let json = r#"{
            "id": 3,
            "product_id": 1,
            "user_id": "8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f",
            "rating": 5,
            "comment": "Отличный смеситель",
            "created_at": "2025-03-01T10:00:00Z",
            "profiles": {"username": "ivan", "avatar_url": null}
        }"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.rating.stars(), 5);
        assert_eq!(review.author_name(), "ivan");
    }

    #[test]
    fn test_review_rejects_out_of_range_rating() {
        let json = r#"{"id":1,"product_id":1,"user_id":"8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f",
                       "rating":7,"comment":"","created_at":"2025-03-01T10:00:00Z"}"#;
        assert!(serde_json::from_str::<Review>(json).is_err());
    }

    #[test]
    fn test_author_name_fallback() {
        assert_eq!(AuthorProfile::default().name(), "Пользователь");
        let author = AuthorProfile {
            username: Some("ivan".to_string()),
            display_name: Some("Иван Петров".to_string()),
            avatar_url: None,
        };
        assert_eq!(author.name(), "Иван Петров");
    }

    #[test]
    fn test_order_row() {
        let json = r#"{
            "id": 10,
            "user_id": "8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f",
            "status": "shipped",
            "total_amount": 45990,
            "shipping_address": {"name": "Иван", "city": "Москва"},
            "created_at": "2025-03-01T10:00:00Z",
            "profiles": {"email": "ivan@example.com", "username": null}
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total_amount, Price::from_rubles(45990));
        assert_eq!(order.shipping_address.unwrap().city, "Москва");
    }

    #[test]
    fn test_profile_shown_name() {
        let json = r#"{"id":"8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f","email":"olga@example.com"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.shown_name(), "olga");
        assert!(!profile.is_admin);
    }

    #[test]
    fn test_new_cart_item_serializes_plain_ids() {
        let item = NewCartItem {
            user_id: "8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f".parse().unwrap(),
            product_id: ProductId::new(4),
            quantity: 1,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            serde_json::json!({
                "user_id": "8d0f4c3e-2b7a-4d5e-9f10-3a2b1c0d9e8f",
                "product_id": 4,
                "quantity": 1
            })
        );
    }
}
