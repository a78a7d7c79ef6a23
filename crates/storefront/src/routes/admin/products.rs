//! Product management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::instrument;

use aqua_dekor_core::ProductId;
use aqua_dekor_core::catalog::{Category, Product};

use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAdmin, push_flash};
use crate::models::Flash;
use crate::routes::layout::PageContext;
use crate::services::admin::ProductFields;
use crate::services::{AdminService, CatalogService};
use crate::state::AppState;

const CURRENT_PATH: &str = "/admin/products";

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub products: Vec<Product>,
}

/// Product create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    /// `None` when creating.
    pub product_id: Option<ProductId>,
    pub fields: ProductFields,
    pub categories: Vec<Category>,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    /// Form action URL.
    #[must_use]
    pub fn action(&self) -> String {
        self.product_id
            .map_or_else(|| CURRENT_PATH.to_string(), |id| format!("{CURRENT_PATH}/{id}"))
    }

    #[must_use]
    pub fn is_selected(&self, category: &Category) -> bool {
        self.fields.category_id.trim() == category.id.to_string()
    }
}

async fn categories(state: &AppState) -> Vec<Category> {
    CatalogService::new(state.supabase())
        .categories()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load categories: {e}");
            Vec::new()
        })
}

/// Product list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> ProductsIndexTemplate {
    let products = AdminService::new(state.supabase(), Some(&admin.access_token))
        .products()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch products: {e}");
            vec![]
        });

    ProductsIndexTemplate {
        ctx,
        current_path: CURRENT_PATH,
        products,
    }
}

/// New product form.
#[instrument(skip_all)]
pub async fn new(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> ProductFormTemplate {
    ProductFormTemplate {
        ctx,
        current_path: CURRENT_PATH,
        product_id: None,
        fields: ProductFields::default(),
        categories: categories(&state).await,
        error: None,
    }
}

/// Edit product form.
#[instrument(skip(admin, state, ctx))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate, AppError> {
    let product = AdminService::new(state.supabase(), Some(&admin.access_token))
        .product(id)
        .await?;

    Ok(ProductFormTemplate {
        ctx,
        current_path: CURRENT_PATH,
        product_id: Some(id),
        fields: ProductFields::from_product(&product),
        categories: categories(&state).await,
        error: None,
    })
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(fields): Form<ProductFields>,
) -> Response {
    save(&state, &session, ctx, &admin.access_token, None, fields).await
}

/// Update a product.
#[instrument(skip(admin, state, session, ctx, fields))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Path(id): Path<ProductId>,
    Form(fields): Form<ProductFields>,
) -> Response {
    save(&state, &session, ctx, &admin.access_token, Some(id), fields).await
}

/// Validate and write; invalid or rejected input re-renders the form with
/// the entered values.
async fn save(
    state: &AppState,
    session: &Session,
    ctx: PageContext,
    token: &crate::supabase::SessionToken,
    product_id: Option<ProductId>,
    fields: ProductFields,
) -> Response {
    let admin = AdminService::new(state.supabase(), Some(token));
    let result = match fields.to_input(Utc::now()) {
        Err(message) => Err(message),
        Ok(input) => match product_id {
            Some(id) => admin.update_product(id, &input).await,
            None => admin.create_product(&input).await,
        }
        .map_err(|e| {
            tracing::error!("Failed to save product: {e}");
            e.user_message()
        }),
    };

    match result {
        Ok(()) => {
            let message = if product_id.is_some() {
                "Товар обновлён"
            } else {
                "Товар добавлен"
            };
            push_flash(session, Flash::success(message)).await;
            Redirect::to(CURRENT_PATH).into_response()
        }
        Err(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ProductFormTemplate {
                ctx,
                current_path: CURRENT_PATH,
                product_id,
                fields,
                categories: categories(state).await,
                error: Some(message),
            },
        )
            .into_response(),
    }
}

/// Delete a product.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Redirect {
    let flash = match AdminService::new(state.supabase(), Some(&admin.access_token))
        .delete_product(id)
        .await
    {
        Ok(()) => Flash::success("Товар удалён"),
        Err(e) => {
            tracing::error!("Failed to delete product {id}: {e}");
            Flash::error(e.user_message())
        }
    };

    push_flash(&session, flash).await;
    Redirect::to(CURRENT_PATH)
}
