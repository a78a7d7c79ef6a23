//! Admin-area operations: products, articles, orders and users.
//!
//! Authorization is enforced by the backend's row-level policies on the
//! admin's own token. The CLI reuses this service with the service-role key
//! and no user token.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

use aqua_dekor_core::catalog::{Category, Product};
use aqua_dekor_core::{ArticleId, CategoryId, OrderId, OrderStatus, Price, ProductId, UserId};

use crate::supabase::types::{
    AdminFlagChange, Article, ArticleInput, NewCategory, Order, OrderStatusChange, Profile,
    ProductInput, PublishChange,
};
use crate::supabase::{Direction, SessionToken, SupabaseClient, SupabaseError, tables};

// =============================================================================
// Form parsing
// =============================================================================

/// Raw product form fields as posted by the admin form.
///
/// Checkboxes are present (`"on"`) when ticked and absent otherwise.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: String,
    pub old_price: String,
    pub inventory: String,
    pub category_id: String,
    pub image_url: String,
    pub featured: Option<String>,
    pub is_new: Option<String>,
    pub is_bestseller: Option<String>,
    /// One `Ключ: значение` pair per line.
    pub specifications: String,
}

impl ProductFields {
    /// Prefill the edit form from a stored product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        let checkbox = |on: bool| on.then(|| "on".to_string());
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            old_price: product
                .old_price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            inventory: product.inventory.to_string(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
            featured: checkbox(product.featured),
            is_new: checkbox(product.is_new),
            is_bestseller: checkbox(product.is_bestseller),
            specifications: product
                .specification_rows()
                .into_iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    #[must_use]
    pub const fn is_checked(field: Option<&String>) -> bool {
        field.is_some()
    }

    /// Validate into a write payload.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn to_input(&self, now: DateTime<Utc>) -> Result<ProductInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Введите название товара".to_string());
        }

        let price = parse_price(&self.price)
            .filter(|p| p.amount() > Decimal::ZERO)
            .ok_or_else(|| "Некорректная цена".to_string())?;

        let old_price = if self.old_price.trim().is_empty() {
            None
        } else {
            Some(parse_price(&self.old_price).ok_or_else(|| "Некорректная старая цена".to_string())?)
        };

        let inventory = match self.inventory.trim() {
            "" => 0,
            text => text
                .parse::<i32>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| "Некорректное количество на складе".to_string())?,
        };

        let category_id = match self.category_id.trim() {
            "" => None,
            text => Some(
                text.parse::<CategoryId>()
                    .map_err(|_| "Некорректная категория".to_string())?,
            ),
        };

        Ok(ProductInput {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            old_price,
            inventory,
            category_id,
            image_url: non_empty(&self.image_url),
            featured: Self::is_checked(self.featured.as_ref()),
            is_new: Self::is_checked(self.is_new.as_ref()),
            is_bestseller: Self::is_checked(self.is_bestseller.as_ref()),
            specifications: parse_specifications(&self.specifications),
            updated_at: now,
        })
    }
}

/// Raw article form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArticleFields {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image_url: String,
    pub published: Option<String>,
}

impl ArticleFields {
    #[must_use]
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            slug: article.slug.clone(),
            content: article.content.clone(),
            image_url: article.image_url.clone().unwrap_or_default(),
            published: article.published.then(|| "on".to_string()),
        }
    }

    /// Validate into a write payload. An empty slug is derived from the
    /// title.
    ///
    /// # Errors
    ///
    /// Returns the message to show above the form.
    pub fn to_input(
        &self,
        author_id: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<ArticleInput, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Введите заголовок статьи".to_string());
        }

        let slug = match self.slug.trim() {
            "" => slugify(title),
            given => given.to_string(),
        };
        if !is_valid_slug(&slug) {
            return Err(
                "Адрес статьи может содержать только латинские буквы, цифры и дефис".to_string(),
            );
        }

        Ok(ArticleInput {
            title: title.to_string(),
            slug,
            content: self.content.clone(),
            image_url: non_empty(&self.image_url),
            published: self.published.is_some(),
            author_id,
            updated_at: now,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Parse `12990`, `12 990` or `12990,50`.
fn parse_price(text: &str) -> Option<Price> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '₽')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    normalized
        .parse::<Decimal>()
        .ok()
        .filter(|d| !d.is_sign_negative())
        .map(Price::new)
}

/// `Ключ: значение` lines into a JSON object. Lines without a colon are
/// skipped.
fn parse_specifications(text: &str) -> Map<String, Value> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect()
}

/// URL slug from a title: Cyrillic transliterated, lowercase ASCII words
/// joined by `-`.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if let Some(latin) = transliterate(ch) {
            out.push_str(latin);
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

const fn transliterate(ch: char) -> Option<&'static str> {
    Some(match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'э' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        'ъ' | 'ь' => "",
        _ => return None,
    })
}

// =============================================================================
// AdminService
// =============================================================================

/// Row counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardCounts {
    pub products: usize,
    pub articles: usize,
    pub orders: usize,
    pub users: usize,
}

/// Admin reads and writes.
pub struct AdminService<'a> {
    client: &'a SupabaseClient,
    token: Option<&'a SessionToken>,
}

impl<'a> AdminService<'a> {
    /// `token` is the admin's access token, or `None` when `client` was
    /// built with the service-role key.
    #[must_use]
    pub const fn new(client: &'a SupabaseClient, token: Option<&'a SessionToken>) -> Self {
        Self { client, token }
    }

    fn table(&self, table: &str) -> crate::supabase::Query<'a> {
        self.client.table(table).auth(self.token)
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if any count query fails.
    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardCounts, SupabaseError> {
        Ok(DashboardCounts {
            products: self.count(tables::PRODUCTS).await?,
            articles: self.count(tables::ARTICLES).await?,
            orders: self.count(tables::ORDERS).await?,
            users: self.count(tables::PROFILES).await?,
        })
    }

    async fn count(&self, table: &str) -> Result<usize, SupabaseError> {
        let rows: Vec<Value> = self.table(table).select("id").fetch().await?;
        Ok(rows.len())
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, SupabaseError> {
        self.table(tables::PRODUCTS)
            .select(tables::PRODUCT_WITH_CATEGORY)
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` for an unknown id.
    pub async fn product(&self, id: ProductId) -> Result<Product, SupabaseError> {
        self.table(tables::PRODUCTS)
            .select(tables::PRODUCT_WITH_CATEGORY)
            .eq("id", id)
            .fetch_one()
            .await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the insert is rejected.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<(), SupabaseError> {
        self.table(tables::PRODUCTS).insert(input).await
    }

    /// Insert several products at once (seeding).
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the insert is rejected.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn create_products(&self, inputs: &[ProductInput]) -> Result<(), SupabaseError> {
        if inputs.is_empty() {
            return Ok(());
        }
        self.table(tables::PRODUCTS).insert(inputs).await
    }

    /// Insert categories and return them with their generated ids.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the insert is rejected (e.g. duplicate slug).
    #[instrument(skip(self, categories), fields(count = categories.len()))]
    pub async fn create_categories(
        &self,
        categories: &[NewCategory],
    ) -> Result<Vec<Category>, SupabaseError> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        self.table(tables::CATEGORIES)
            .insert_returning(categories)
            .await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the update fails.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), SupabaseError> {
        self.table(tables::PRODUCTS).eq("id", id).update(input).await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), SupabaseError> {
        self.table(tables::PRODUCTS).eq("id", id).delete().await
    }

    // -------------------------------------------------------------------------
    // Articles
    // -------------------------------------------------------------------------

    /// Every article, drafts included, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn articles(&self) -> Result<Vec<Article>, SupabaseError> {
        self.table(tables::ARTICLES)
            .select(tables::ARTICLE_WITH_AUTHOR)
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError::NotFound` for an unknown id.
    pub async fn article(&self, id: ArticleId) -> Result<Article, SupabaseError> {
        self.table(tables::ARTICLES)
            .select("*")
            .eq("id", id)
            .fetch_one()
            .await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the insert is rejected (e.g. a duplicate
    /// slug).
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_article(&self, input: &ArticleInput) -> Result<(), SupabaseError> {
        self.table(tables::ARTICLES).insert(input).await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the update fails.
    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn update_article(
        &self,
        id: ArticleId,
        input: &ArticleInput,
    ) -> Result<(), SupabaseError> {
        self.table(tables::ARTICLES).eq("id", id).update(input).await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_article(&self, id: ArticleId) -> Result<(), SupabaseError> {
        self.table(tables::ARTICLES).eq("id", id).delete().await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the update fails.
    #[instrument(skip(self))]
    pub async fn set_published(&self, id: ArticleId, published: bool) -> Result<(), SupabaseError> {
        self.table(tables::ARTICLES)
            .eq("id", id)
            .update(&PublishChange {
                published,
                updated_at: Utc::now(),
            })
            .await
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    /// Orders with customer contact fields, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails or a row carries an
    /// unknown status.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, SupabaseError> {
        self.table(tables::ORDERS)
            .select(tables::ORDER_WITH_CUSTOMER)
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the update fails.
    #[instrument(skip(self))]
    pub async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), SupabaseError> {
        self.table(tables::ORDERS)
            .eq("id", id)
            .update(&OrderStatusChange {
                status,
                updated_at: Utc::now(),
            })
            .await
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// Every profile, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<Profile>, SupabaseError> {
        self.table(tables::PROFILES)
            .select("*")
            .order("created_at", Direction::Desc)
            .fetch()
            .await
    }

    /// Look a profile up by email.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the fetch fails.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<Profile>, SupabaseError> {
        self.table(tables::PROFILES)
            .select("*")
            .eq("email", email)
            .fetch_optional()
            .await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError` if the update fails.
    #[instrument(skip(self))]
    pub async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<(), SupabaseError> {
        self.table(tables::PROFILES)
            .eq("id", id)
            .update(&AdminFlagChange { is_admin })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn fields() -> ProductFields {
        ProductFields {
            name: "Смеситель Grohe Eurosmart".to_string(),
            price: "12 990".to_string(),
            old_price: "15990".to_string(),
            inventory: "7".to_string(),
            category_id: "2".to_string(),
            is_bestseller: Some("on".to_string()),
            specifications: "Материал: латунь\nЦвет: хром\nбез двоеточия".to_string(),
            ..ProductFields::default()
        }
    }

    #[test]
    fn test_product_fields_to_input() {
        let input = fields().to_input(now()).unwrap();
        assert_eq!(input.price, Price::from_rubles(12990));
        assert_eq!(input.old_price, Some(Price::from_rubles(15990)));
        assert_eq!(input.inventory, 7);
        assert_eq!(input.category_id, Some(CategoryId::new(2)));
        assert!(input.is_bestseller);
        assert!(!input.featured);
        assert_eq!(input.specifications.len(), 2);
        assert_eq!(input.specifications["Цвет"], Value::String("хром".to_string()));
    }

    #[test]
    fn test_specifications_keep_entered_order() {
        let mut entered = fields();
        entered.specifications = "Цвет: хром\nГарантия, лет: 5\nВысота: 120 мм".to_string();

        let input = entered.to_input(now()).unwrap();
        let keys: Vec<&str> = input.specifications.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Цвет", "Гарантия, лет", "Высота"]);
    }

    #[test]
    fn test_product_fields_validation() {
        let mut bad = fields();
        bad.name = "  ".to_string();
        assert_eq!(bad.to_input(now()).unwrap_err(), "Введите название товара");

        let mut bad = fields();
        bad.price = "дорого".to_string();
        assert_eq!(bad.to_input(now()).unwrap_err(), "Некорректная цена");

        let mut bad = fields();
        bad.price = "0".to_string();
        assert!(bad.to_input(now()).is_err());

        let mut bad = fields();
        bad.inventory = "-1".to_string();
        assert!(bad.to_input(now()).is_err());
    }

    #[test]
    fn test_parse_price_accepts_comma_decimal() {
        assert_eq!(
            parse_price("1 234,50").map(|p| p.amount()),
            Some(Decimal::new(123_450, 2))
        );
        assert!(parse_price("-5").is_none());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Как выбрать смеситель"), "kak-vybrat-smesitel");
        assert_eq!(slugify("Shower  Heads 2025!"), "shower-heads-2025");
        assert_eq!(slugify("  --  "), "");
    }

    #[test]
    fn test_article_fields() {
        let fields = ArticleFields {
            title: "Уход за душевой кабиной".to_string(),
            content: "# Текст".to_string(),
            published: Some("on".to_string()),
            ..ArticleFields::default()
        };
        let input = fields.to_input(None, now()).unwrap();
        assert_eq!(input.slug, "uhod-za-dushevoy-kabinoy");
        assert!(input.published);

        let bad = ArticleFields {
            title: "Статья".to_string(),
            slug: "Плохой Slug".to_string(),
            ..ArticleFields::default()
        };
        assert!(bad.to_input(None, now()).is_err());
    }
}
