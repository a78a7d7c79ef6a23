//! Storefront services against the fake backend.
//!
//! Each service turns a user action into remote reads and writes; these
//! tests check the rows that end up in the backend and the in-memory state
//! the handlers render from.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::Utc;
use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;

use aqua_dekor_core::favorites::FavoriteWrite;
use aqua_dekor_core::{ArticleId, OrderId, OrderStatus, ProductId, Rating, ReviewId, UserId};
use aqua_dekor_integration_tests::FakeBackend;
use aqua_dekor_integration_tests::fixtures::{self, ADMIN_EMAIL, PASSWORD, SHOPPER_EMAIL};
use aqua_dekor_storefront::models::CurrentUser;
use aqua_dekor_storefront::services::admin::{ArticleFields, ProductFields, slugify};
use aqua_dekor_storefront::services::auth::{Registered, Registration};
use aqua_dekor_storefront::services::profile::ProfileForm;
use aqua_dekor_storefront::services::{
    AdminService, AuthError, AuthService, BlogService, CartService, CatalogService,
    FavoritesService, ProfileService, ReviewService,
};
use aqua_dekor_storefront::supabase::SupabaseError;

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

async fn shopper(backend: &FakeBackend) -> CurrentUser {
    backend.add_user(SHOPPER_EMAIL, PASSWORD);
    AuthService::new(&backend.client())
        .sign_in(SHOPPER_EMAIL, &secret(PASSWORD))
        .await
        .unwrap()
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_sign_in_reads_admin_flag_from_profile() {
    let backend = FakeBackend::start().await;
    backend.add_user(SHOPPER_EMAIL, PASSWORD);
    let admin_id = backend.add_user(ADMIN_EMAIL, PASSWORD);
    backend.grant_admin(admin_id);
    let client = backend.client();
    let auth = AuthService::new(&client);

    let user = auth.sign_in(SHOPPER_EMAIL, &secret(PASSWORD)).await.unwrap();
    assert!(!user.is_admin);
    assert_eq!(user.short_name(), "shopper");

    let admin = auth.sign_in(ADMIN_EMAIL, &secret(PASSWORD)).await.unwrap();
    assert!(admin.is_admin);

    let lookup = &backend.requests_to("/rest/v1/profiles")[0];
    assert_eq!(lookup.param("select"), Some("is_admin"));
    assert_eq!(lookup.bearer(), Some(user.access_token.expose()));
}

#[tokio::test]
async fn test_sign_in_trims_email() {
    let backend = FakeBackend::start().await;
    backend.add_user(SHOPPER_EMAIL, PASSWORD);

    let user = AuthService::new(&backend.client())
        .sign_in("  shopper@example.ru ", &secret(PASSWORD))
        .await
        .unwrap();
    assert_eq!(user.email.as_str(), SHOPPER_EMAIL);
}

#[tokio::test]
async fn test_admin_sign_in_refuses_and_revokes_non_admin() {
    let backend = FakeBackend::start().await;
    backend.add_user(SHOPPER_EMAIL, PASSWORD);

    let err = AuthService::new(&backend.client())
        .admin_sign_in(SHOPPER_EMAIL, &secret(PASSWORD))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::NotAdmin));
    assert_eq!(
        err.user_message(),
        "Доступ запрещен. У вас нет прав администратора."
    );
    let logout = &backend.requests_to("/auth/v1/logout")[0];
    assert!(!backend.is_token_active(logout.bearer().unwrap()));
}

#[tokio::test]
async fn test_sign_up_validates_before_calling_backend() {
    let backend = FakeBackend::start().await;
    let registration = Registration {
        email: "ivan@example.ru".to_string(),
        password: secret("abc"),
        password_confirm: secret("abc"),
        first_name: String::new(),
        last_name: String::new(),
    };

    let err = AuthService::new(&backend.client())
        .sign_up(&registration, "http://localhost/auth/callback")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::WeakPassword));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_sign_up_with_confirmation_then_confirm_email() {
    let backend = FakeBackend::start().await;
    backend.set_autoconfirm(false);
    let client = backend.client();
    let auth = AuthService::new(&client);

    let registration = Registration {
        email: "Ivan@Example.ru".to_string(),
        password: secret(PASSWORD),
        password_confirm: secret(PASSWORD),
        first_name: " Иван ".to_string(),
        last_name: "Петров".to_string(),
    };
    let registered = auth
        .sign_up(&registration, "http://localhost/auth/callback")
        .await
        .unwrap();
    assert!(matches!(registered, Registered::ConfirmationSent(_)));

    let signup = &backend.requests_to("/auth/v1/signup")[0];
    assert_eq!(signup.body["data"]["first_name"], "Иван");

    let token = backend.confirmation_token("ivan@example.ru").unwrap();
    let user = auth
        .confirm_email(Some(&token), Some("signup"))
        .await
        .unwrap();
    assert_eq!(user.email.as_str(), "ivan@example.ru");

    let profile = backend
        .rows("profiles")
        .into_iter()
        .find(|p| p["email"] == "ivan@example.ru")
        .unwrap();
    assert_eq!(profile["email_verified"], true);
}

#[tokio::test]
async fn test_confirm_email_rejects_bad_links() {
    let backend = FakeBackend::start().await;
    let client = backend.client();
    let auth = AuthService::new(&client);

    assert!(matches!(
        auth.confirm_email(None, Some("signup")).await,
        Err(AuthError::InvalidLink)
    ));
    assert!(matches!(
        auth.confirm_email(Some("abc"), Some("teleport")).await,
        Err(AuthError::InvalidLink)
    ));
    assert!(backend.requests().is_empty());

    let expired = auth
        .confirm_email(Some("confirm-unknown"), None)
        .await
        .unwrap_err();
    assert!(matches!(expired, AuthError::Supabase(SupabaseError::Api { status: 403, .. })));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_cart_add_inserts_then_increments() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let user = shopper(&backend).await;
    let client = backend.client();
    let service = CartService::new(&client, &user);

    let mut cart = service.load().await.unwrap();
    assert!(cart.is_empty());

    service.add(&mut cart, ProductId::new(3)).await.unwrap();
    service.add(&mut cart, ProductId::new(3)).await.unwrap();
    service.add(&mut cart, ProductId::new(1)).await.unwrap();

    assert_eq!(cart.quantity_of(ProductId::new(3)), 2);
    assert_eq!(cart.item_count(), 3);

    let rows = backend.rows("cart_items");
    assert_eq!(rows.len(), 2);
    let bathtub = rows.iter().find(|r| r["product_id"] == 3).unwrap();
    assert_eq!(bathtub["quantity"], 2);
    assert_eq!(bathtub["user_id"], user.id.to_string());

    let reloaded = service.load().await.unwrap();
    let order: Vec<i64> = reloaded
        .lines()
        .iter()
        .map(|line| line.product.id.as_i64())
        .collect();
    assert_eq!(order, [3, 1]);
    assert_eq!(reloaded.total(), cart.total());
}

#[tokio::test]
async fn test_cart_quantity_zero_removes_line() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let user = shopper(&backend).await;
    let client = backend.client();
    let service = CartService::new(&client, &user);

    let mut cart = service.load().await.unwrap();
    service.add(&mut cart, ProductId::new(1)).await.unwrap();
    service
        .set_quantity(&mut cart, ProductId::new(1), 5)
        .await
        .unwrap();
    assert_eq!(backend.rows("cart_items")[0]["quantity"], 5);

    service
        .set_quantity(&mut cart, ProductId::new(1), 0)
        .await
        .unwrap();
    assert!(cart.is_empty());
    assert!(backend.rows("cart_items").is_empty());
}

#[tokio::test]
async fn test_cart_failed_write_leaves_cart_untouched() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let user = shopper(&backend).await;
    let client = backend.client();
    let service = CartService::new(&client, &user);

    let mut cart = service.load().await.unwrap();
    let missing = service.add(&mut cart, ProductId::new(999)).await.unwrap_err();
    assert!(matches!(missing, SupabaseError::NotFound(_)));

    backend.fail_next(
        "/rest/v1/cart_items",
        500,
        json!({"message": "could not write"}),
    );
    assert!(service.add(&mut cart, ProductId::new(1)).await.is_err());

    assert!(cart.is_empty());
    assert!(backend.rows("cart_items").is_empty());
}

#[tokio::test]
async fn test_cart_skips_lines_of_deleted_products() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let user = shopper(&backend).await;
    backend.seed(
        "cart_items",
        [
            json!({"user_id": user.id.to_string(), "product_id": 2, "quantity": 1}),
            json!({"user_id": user.id.to_string(), "product_id": 77, "quantity": 4}),
        ],
    );

    let cart = CartService::new(&backend.client(), &user)
        .load()
        .await
        .unwrap();
    assert_eq!(cart.line_count(), 1);
    assert_eq!(cart.item_count(), 1);
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_favorites_toggle_adds_then_removes() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let user = shopper(&backend).await;
    let client = backend.client();
    let service = FavoritesService::new(&client, &user);

    let mut favorites = service.load().await.unwrap();
    let added = service
        .toggle(&mut favorites, ProductId::new(2))
        .await
        .unwrap();
    assert_eq!(added, FavoriteWrite::Add(ProductId::new(2)));
    assert!(favorites.contains(ProductId::new(2)));
    assert_eq!(backend.rows("favorites").len(), 1);

    let mut favorites = service.load().await.unwrap();
    assert_eq!(favorites.products()[0].name, "Смеситель Бронза");

    let removed = service
        .toggle(&mut favorites, ProductId::new(2))
        .await
        .unwrap();
    assert_eq!(removed, FavoriteWrite::Remove(ProductId::new(2)));
    assert!(favorites.is_empty());
    assert!(backend.rows("favorites").is_empty());
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_catalog_reads() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let client = backend.client();
    let catalog = CatalogService::new(&client);

    let products = catalog.products().await.unwrap();
    let ids: Vec<i64> = products.iter().map(|p| p.id.as_i64()).collect();
    assert_eq!(ids, [4, 3, 2, 1]);

    let best: Vec<i64> = catalog
        .best_sellers()
        .await
        .unwrap()
        .iter()
        .map(|p| p.id.as_i64())
        .collect();
    assert_eq!(best, [3, 1]);

    let categories: Vec<String> = catalog
        .categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.slug)
        .collect();
    assert_eq!(categories, ["bathtubs", "mixers"]);

    let product = catalog.product(ProductId::new(2)).await.unwrap();
    assert_eq!(product.discount_percent(), Some(20));
    assert!(matches!(
        catalog.product(ProductId::new(50)).await,
        Err(SupabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_reviews_embed_author() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let author = backend.add_user(SHOPPER_EMAIL, PASSWORD);
    let profile_id = author.to_string();
    backend.seed(
        "reviews",
        [
            json!({"product_id": 1, "user_id": profile_id, "rating": 5, "comment": "Отличный смеситель"}),
            json!({"product_id": 1, "user_id": profile_id, "rating": 3, "comment": "Капает"}),
            json!({"product_id": 2, "user_id": profile_id, "rating": 4, "comment": "Другой товар"}),
        ],
    );

    let reviews = CatalogService::new(&backend.client())
        .reviews(ProductId::new(1))
        .await
        .unwrap();

    let comments: Vec<&str> = reviews.iter().map(|r| r.comment.as_str()).collect();
    assert_eq!(comments, ["Капает", "Отличный смеситель"]);
    assert_eq!(reviews[0].author_name(), "Пользователь");
    assert!(reviews[0].profiles.is_some());
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_review_writes_are_limited_to_own_rows() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let other = backend.add_user("other@example.ru", PASSWORD);
    backend.seed(
        "reviews",
        [fixtures::review(1, 3, other, 4, "Чужой отзыв")],
    );
    let user = shopper(&backend).await;
    let client = backend.client();
    let reviews = ReviewService::new(&client, &user);

    reviews
        .create(ProductId::new(3), Rating::new(5).unwrap(), "  Отличная ванна \n")
        .await
        .unwrap();
    reviews
        .update(ReviewId::new(1), Rating::new(1).unwrap(), "Переписано")
        .await
        .unwrap();
    reviews.delete(ReviewId::new(1)).await.unwrap();

    let rows = backend.rows("reviews");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["comment"], "Чужой отзыв");
    assert_eq!(rows[0]["rating"], 4);
    assert_eq!(rows[1]["comment"], "Отличная ванна");
    assert_eq!(rows[1]["user_id"], json!(user.id));

    let writes = backend.requests_to("/rest/v1/reviews");
    let owner = format!("eq.{}", user.id);
    assert_eq!(writes[1].param("user_id"), Some(owner.as_str()));
    assert_eq!(writes[2].param("user_id"), Some(owner.as_str()));
}

#[tokio::test]
async fn test_review_edit_and_delete_own_row() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let user = shopper(&backend).await;
    let client = backend.client();
    let reviews = ReviewService::new(&client, &user);

    reviews
        .create(ProductId::new(1), Rating::new(3).unwrap(), "Капает")
        .await
        .unwrap();
    reviews
        .update(ReviewId::new(1), Rating::new(5).unwrap(), "Заменили картридж")
        .await
        .unwrap();
    assert_eq!(backend.rows("reviews")[0]["rating"], 5);
    assert_eq!(backend.rows("reviews")[0]["comment"], "Заменили картридж");

    reviews.delete(ReviewId::new(1)).await.unwrap();
    assert!(backend.rows("reviews").is_empty());
}

// ============================================================================
// Blog & profile
// ============================================================================

#[tokio::test]
async fn test_blog_reads_only_published_articles() {
    let backend = FakeBackend::start().await;
    let author = Uuid::new_v4();
    backend.seed(
        "profiles",
        [json!({"id": author, "display_name": "Редакция", "is_admin": true})],
    );
    backend.seed(
        "articles",
        [
            fixtures::with(
                fixtures::article(
                    1,
                    "Как выбрать смеситель",
                    "kak-vybrat-smesitel",
                    "Смотрите на **картридж**.\n\n<script>alert(1)</script>",
                    true,
                ),
                "author_id",
                json!(author),
            ),
            fixtures::article(2, "Черновик", "chernovik", "Скоро", false),
        ],
    );
    let client = backend.client();
    let blog = BlogService::new(&client);

    let published = blog.published().await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].author_name(), "Редакция");
    assert_eq!(published[0].reading_time_minutes, 1);

    let article = blog.article("kak-vybrat-smesitel").await.unwrap();
    let html = article.body_html();
    assert!(html.contains("<strong>картридж</strong>"));
    assert!(!html.contains("<script>"));

    assert!(matches!(
        blog.article("chernovik").await,
        Err(SupabaseError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_profile_update_saves_trimmed_fields() {
    let backend = FakeBackend::start().await;
    let user = shopper(&backend).await;
    let client = backend.client();
    let profiles = ProfileService::new(&client, &user);

    let form = ProfileForm::parse("  Ольга ", "https://cdn.example.com/olga.png").unwrap();
    profiles.update(form).await.unwrap();

    let profile = profiles.load().await.unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Ольга"));
    assert_eq!(
        profile.avatar_url.as_deref(),
        Some("https://cdn.example.com/olga.png")
    );
    assert_eq!(profile.shown_name(), "Ольга");
    let lookup = &backend.requests_to("/rest/v1/rpc/get_current_profile")[0];
    assert_eq!(lookup.bearer(), Some(user.access_token.expose()));

    profiles.update(ProfileForm::default()).await.unwrap();
    assert!(profiles.load().await.unwrap().display_name.is_none());
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn test_admin_product_lifecycle() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let client = backend.client();
    let admin = AdminService::new(&client, None);

    let fields = ProductFields {
        name: "Душевая система Grohe".to_string(),
        price: "32 990".to_string(),
        inventory: "5".to_string(),
        category_id: "1".to_string(),
        is_new: Some("on".to_string()),
        specifications: "Материал: латунь\nДиаметр лейки: 210 мм".to_string(),
        ..ProductFields::default()
    };
    admin
        .create_product(&fields.to_input(Utc::now()).unwrap())
        .await
        .unwrap();

    let created = admin.product(ProductId::new(5)).await.unwrap();
    assert_eq!(created.name, "Душевая система Grohe");
    assert!(created.is_new);
    assert_eq!(created.category_slug(), Some("mixers"));

    let mut edit = ProductFields::from_product(&created);
    edit.inventory = "0".to_string();
    admin
        .update_product(created.id, &edit.to_input(Utc::now()).unwrap())
        .await
        .unwrap();
    assert!(!admin.product(created.id).await.unwrap().in_stock());

    admin.delete_product(created.id).await.unwrap();
    assert_eq!(admin.products().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_admin_article_publish_toggle() {
    let backend = FakeBackend::start().await;
    let author = backend.add_user(ADMIN_EMAIL, PASSWORD);
    let client = backend.client();
    let admin = AdminService::new(&client, None);

    let fields = ArticleFields {
        title: "Уход за смесителем".to_string(),
        content: "Протирайте мягкой тканью.".to_string(),
        ..ArticleFields::default()
    };
    admin
        .create_article(&fields.to_input(Some(UserId::new(author)), Utc::now()).unwrap())
        .await
        .unwrap();

    let slug = slugify("Уход за смесителем");
    let rows = backend.rows("articles");
    assert_eq!(rows[0]["slug"], json!(slug));
    assert_eq!(rows[0]["published"], false);

    let blog = BlogService::new(&client);
    assert!(blog.published().await.unwrap().is_empty());

    admin.set_published(ArticleId::new(1), true).await.unwrap();
    assert_eq!(blog.article(&slug).await.unwrap().article.title, "Уход за смесителем");

    admin.delete_article(ArticleId::new(1)).await.unwrap();
    assert!(admin.articles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_order_status_and_admin_flag() {
    let backend = FakeBackend::start().await;
    let customer = backend.add_user(SHOPPER_EMAIL, PASSWORD);
    backend.seed("orders", [fixtures::order(1, customer, "pending", 30980.0)]);
    let client = backend.client();
    let admin = AdminService::new(&client, None);

    admin
        .set_order_status(OrderId::new(1), OrderStatus::Shipped)
        .await
        .unwrap();
    let orders = admin.orders().await.unwrap();
    assert_eq!(orders[0].status, OrderStatus::Shipped);
    assert_eq!(
        orders[0].profiles.as_ref().and_then(|p| p.email.as_deref()),
        Some(SHOPPER_EMAIL)
    );

    admin.set_admin(UserId::new(customer), true).await.unwrap();
    let profile = admin.user_by_email(SHOPPER_EMAIL).await.unwrap().unwrap();
    assert!(profile.is_admin);
}
