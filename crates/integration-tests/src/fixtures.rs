//! Rows shaped like the backend's catalog, review, article and order tables.

use serde_json::{Value, json};
use uuid::Uuid;

use crate::backend::FakeBackend;

/// Password shared by the seeded accounts.
pub const PASSWORD: &str = "пароль-123";

pub const SHOPPER_EMAIL: &str = "shopper@example.ru";
pub const ADMIN_EMAIL: &str = "admin@shmaquadekor.com";

#[must_use]
pub fn category(id: i64, name: &str, slug: &str) -> Value {
    json!({"id": id, "name": name, "slug": slug, "description": null, "image_url": null})
}

/// An in-stock product with no flags set.
#[must_use]
pub fn product(id: i64, name: &str, price: f64, category_id: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name}: описание"),
        "price": price,
        "old_price": null,
        "inventory": 10,
        "category_id": category_id,
        "image_url": null,
        "featured": false,
        "is_new": false,
        "is_bestseller": false,
        "rating": 4.5,
        "specifications": {"Материал": "латунь"},
    })
}

#[must_use]
pub fn review(id: i64, product_id: i64, user_id: Uuid, rating: i64, comment: &str) -> Value {
    json!({
        "id": id,
        "product_id": product_id,
        "user_id": user_id,
        "rating": rating,
        "comment": comment,
    })
}

#[must_use]
pub fn article(id: i64, title: &str, slug: &str, content: &str, published: bool) -> Value {
    json!({
        "id": id,
        "title": title,
        "slug": slug,
        "content": content,
        "image_url": null,
        "published": published,
        "author_id": null,
    })
}

#[must_use]
pub fn order(id: i64, user_id: Uuid, status: &str, total_amount: f64) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "status": status,
        "total_amount": total_amount,
        "shipping_address": null,
    })
}

/// Set one field of a fixture row.
#[must_use]
pub fn with(mut row: Value, field: &str, value: Value) -> Value {
    if let Some(fields) = row.as_object_mut() {
        fields.insert(field.to_string(), value);
    }
    row
}

/// Two categories and four products:
///
/// | id | name               | category   | flags        |
/// |----|--------------------|------------|--------------|
/// | 1  | Смеситель Хром     | mixers     | best seller  |
/// | 2  | Смеситель Бронза   | mixers     | new, -20%    |
/// | 3  | Ванна Акриловая    | bathtubs   | best seller  |
/// | 4  | Ванна Чугунная     | bathtubs   | out of stock |
pub fn seed_catalog(backend: &FakeBackend) {
    backend.seed(
        "categories",
        [
            category(1, "Смесители", "mixers"),
            category(2, "Ванны", "bathtubs"),
        ],
    );
    backend.seed(
        "products",
        [
            with(
                product(1, "Смеситель Хром", 4990.0, 1),
                "is_bestseller",
                json!(true),
            ),
            with(
                with(product(2, "Смеситель Бронза", 7990.0, 1), "is_new", json!(true)),
                "old_price",
                json!(9990.0),
            ),
            with(
                product(3, "Ванна Акриловая", 25990.0, 2),
                "is_bestseller",
                json!(true),
            ),
            with(product(4, "Ванна Чугунная", 45990.0, 2), "inventory", json!(0)),
        ],
    );
}
