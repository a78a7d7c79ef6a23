//! Backend client against the fake backend: request shape and error mapping.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use secrecy::SecretString;
use serde_json::{Value, json};

use aqua_dekor_core::Email;
use aqua_dekor_core::catalog::{Category, Product};
use aqua_dekor_integration_tests::fixtures::{self, PASSWORD};
use aqua_dekor_integration_tests::{ANON_KEY, FakeBackend};
use aqua_dekor_storefront::supabase::{
    Direction, SessionToken, SignUpMetadata, SignUpOutcome, SupabaseError, tables,
};

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_fetch_sends_key_and_postgrest_params() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);

    let products: Vec<Product> = backend
        .client()
        .table(tables::PRODUCTS)
        .select(tables::PRODUCT_WITH_CATEGORY)
        .eq("category_id", 1)
        .order("price", Direction::Desc)
        .fetch()
        .await
        .unwrap();

    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Смеситель Бронза", "Смеситель Хром"]);
    assert_eq!(products[0].category_slug(), Some("mixers"));

    let request = &backend.requests_to("/rest/v1/products")[0];
    assert_eq!(request.header("apikey"), Some(ANON_KEY));
    assert_eq!(request.bearer(), Some(ANON_KEY));
    assert_eq!(request.param("category_id"), Some("eq.1"));
    assert_eq!(request.param("order"), Some("price.desc"));
    assert_eq!(request.param("select"), Some("*,categories(id,name,slug)"));
}

#[tokio::test]
async fn test_user_token_replaces_key_as_bearer() {
    let backend = FakeBackend::start().await;
    let token = SessionToken::new("access-token-42".to_string());

    let _: Vec<Value> = backend
        .client()
        .table(tables::CART_ITEMS)
        .auth(Some(&token))
        .fetch()
        .await
        .unwrap();

    let request = &backend.requests_to("/rest/v1/cart_items")[0];
    assert_eq!(request.header("apikey"), Some(ANON_KEY));
    assert_eq!(request.bearer(), Some("access-token-42"));
}

#[tokio::test]
async fn test_fetch_one_without_match_is_not_found() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);

    let err = backend
        .client()
        .table(tables::PRODUCTS)
        .eq("id", 999)
        .fetch_one::<Product>()
        .await
        .unwrap_err();

    assert!(matches!(err, SupabaseError::NotFound(ref table) if table == "products"));
    assert_eq!(err.user_message(), "Запись не найдена");

    let request = &backend.requests_to("/rest/v1/products")[0];
    assert_eq!(
        request.header("accept"),
        Some("application/vnd.pgrst.object+json")
    );
}

#[tokio::test]
async fn test_fetch_optional_limits_to_one_row() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);

    let category: Option<Category> = backend
        .client()
        .table(tables::CATEGORIES)
        .eq("slug", "bathtubs")
        .fetch_optional()
        .await
        .unwrap();

    assert_eq!(category.map(|c| c.name), Some("Ванны".to_string()));
    assert_eq!(
        backend.requests_to("/rest/v1/categories")[0].param("limit"),
        Some("1")
    );
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_insert_returning_yields_generated_ids() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);

    let created: Vec<Category> = backend
        .client()
        .table(tables::CATEGORIES)
        .insert_returning(&json!([
            {"name": "Душевые системы", "slug": "shower-systems"},
            {"name": "Аксессуары", "slug": "accessories"},
        ]))
        .await
        .unwrap();

    let ids: Vec<i64> = created.iter().map(|c| c.id.as_i64()).collect();
    assert_eq!(ids, [3, 4]);

    let request = &backend.requests_to("/rest/v1/categories")[0];
    assert_eq!(request.header("prefer"), Some("return=representation"));
}

#[tokio::test]
async fn test_update_and_delete_touch_only_matching_rows() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);
    let client = backend.client();

    client
        .table(tables::PRODUCTS)
        .eq("id", 4)
        .update(&json!({"inventory": 3}))
        .await
        .unwrap();
    client
        .table(tables::PRODUCTS)
        .eq("id", 1)
        .delete()
        .await
        .unwrap();

    let rows = backend.rows("products");
    assert_eq!(rows.len(), 3);
    let restocked = rows.iter().find(|r| r["id"] == 4).unwrap();
    assert_eq!(restocked["inventory"], 3);
    assert_eq!(
        backend.requests_to("/rest/v1/products")[0].header("prefer"),
        Some("return=minimal")
    );
}

#[tokio::test]
async fn test_unfiltered_update_never_reaches_backend() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);

    let err = backend
        .client()
        .table(tables::PRODUCTS)
        .update(&json!({"inventory": 0}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SupabaseError::UnfilteredWrite {
            operation: "update",
            ..
        }
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_duplicate_insert_maps_to_api_error() {
    let backend = FakeBackend::start().await;
    fixtures::seed_catalog(&backend);

    let err = backend
        .client()
        .table(tables::CATEGORIES)
        .insert(&json!({"name": "Смесители 2", "slug": "mixers"}))
        .await
        .unwrap_err();

    match err {
        SupabaseError::Api { status, code, .. } => {
            assert_eq!(status, 409);
            assert_eq!(code.as_deref(), Some("23505"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ============================================================================
// Status mapping
// ============================================================================

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let backend = FakeBackend::start().await;
    backend.rate_limit_next("/rest/v1/products", 7);

    let err = backend
        .client()
        .table(tables::PRODUCTS)
        .fetch::<Product>()
        .await
        .unwrap_err();

    assert!(matches!(err, SupabaseError::RateLimited(7)));
    assert_eq!(err.user_message(), "Слишком много запросов. Попробуйте позже.");
}

#[tokio::test]
async fn test_server_error_is_hidden_from_shoppers() {
    let backend = FakeBackend::start().await;
    backend.fail_next(
        "/rest/v1/products",
        503,
        json!({"message": "upstream connect error"}),
    );

    let err = backend
        .client()
        .table(tables::PRODUCTS)
        .fetch::<Product>()
        .await
        .unwrap_err();

    assert!(matches!(err, SupabaseError::Api { status: 503, .. }));
    assert!(!err.is_client_error());
    assert_eq!(err.user_message(), "Произошла ошибка. Попробуйте позже.");
}

#[tokio::test]
async fn test_revoked_token_is_unauthorized() {
    let backend = FakeBackend::start().await;
    let token = SessionToken::new("never-issued".to_string());

    let err = backend.client().get_user(&token).await.unwrap_err();

    assert!(matches!(err, SupabaseError::Unauthorized(_)));
    assert_eq!(
        err.user_message(),
        "Сессия истекла. Пожалуйста, войдите снова."
    );
}

#[tokio::test]
async fn test_rpc_posts_arguments() {
    let backend = FakeBackend::start().await;
    backend.set_rpc("product_rating", json!(4.7));

    let rating: f64 = backend
        .client()
        .rpc("product_rating", &json!({"product_id": 3}), None)
        .await
        .unwrap();

    assert!((rating - 4.7).abs() < f64::EPSILON);
    let request = &backend.requests_to("/rest/v1/rpc/product_rating")[0];
    assert_eq!(request.body, json!({"product_id": 3}));
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_password_sign_in_and_refresh() {
    let backend = FakeBackend::start().await;
    let id = backend.add_user(fixtures::SHOPPER_EMAIL, PASSWORD);
    let client = backend.client();
    let email = Email::parse(fixtures::SHOPPER_EMAIL).unwrap();

    let session = client
        .sign_in_with_password(&email, &password(PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.user.id.to_string(), id.to_string());
    assert!(backend.is_token_active(session.access_token.expose()));

    let user = client.get_user(&session.access_token).await.unwrap();
    assert_eq!(user.email.as_deref(), Some(fixtures::SHOPPER_EMAIL));

    let refreshed = client.refresh_session(&session.refresh_token).await.unwrap();
    assert_ne!(refreshed.access_token, session.access_token);

    let token = backend.requests_to("/auth/v1/token");
    assert_eq!(token[0].param("grant_type"), Some("password"));
    assert_eq!(token[1].param("grant_type"), Some("refresh_token"));
}

#[tokio::test]
async fn test_auth_errors_are_translated() {
    let backend = FakeBackend::start().await;
    backend.add_user(fixtures::SHOPPER_EMAIL, PASSWORD);
    backend.add_unconfirmed_user("new@example.ru", PASSWORD);
    let client = backend.client();

    let wrong = client
        .sign_in_with_password(
            &Email::parse(fixtures::SHOPPER_EMAIL).unwrap(),
            &password("не-тот"),
        )
        .await
        .unwrap_err();
    assert_eq!(wrong.user_message(), "Неверный email или пароль");

    let unconfirmed = client
        .sign_in_with_password(&Email::parse("new@example.ru").unwrap(), &password(PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(
        unconfirmed.user_message(),
        "Email не подтвержден. Пожалуйста, проверьте вашу почту."
    );

    let taken = client
        .sign_up(
            &Email::parse(fixtures::SHOPPER_EMAIL).unwrap(),
            &password(PASSWORD),
            &SignUpMetadata::default(),
            "http://localhost/auth/callback",
        )
        .await
        .unwrap_err();
    assert_eq!(
        taken.user_message(),
        "Пользователь с таким email уже существует"
    );
}

#[tokio::test]
async fn test_sign_up_sends_metadata_and_redirect() {
    let backend = FakeBackend::start().await;
    backend.set_autoconfirm(false);

    let outcome = backend
        .client()
        .sign_up(
            &Email::parse("ivan@example.ru").unwrap(),
            &password(PASSWORD),
            &SignUpMetadata {
                first_name: "Иван".to_string(),
                last_name: "Петров".to_string(),
            },
            "http://localhost:3000/auth/callback",
        )
        .await
        .unwrap();

    assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
    let request = &backend.requests_to("/auth/v1/signup")[0];
    assert_eq!(
        request.param("redirect_to"),
        Some("http://localhost:3000/auth/callback")
    );
    assert_eq!(request.body["data"]["first_name"], "Иван");
    assert!(backend.confirmation_token("ivan@example.ru").is_some());
}
