//! Order list and status changes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aqua_dekor_core::{OrderId, OrderStatus};

use crate::filters;
use crate::middleware::{RequireAdmin, push_flash};
use crate::models::Flash;
use crate::routes::layout::PageContext;
use crate::services::AdminService;
use crate::state::AppState;
use crate::supabase::types::Order;

const CURRENT_PATH: &str = "/admin/orders";

/// Status form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Order view for templates.
#[derive(Debug, Clone)]
pub struct OrderListItem {
    pub order: Order,
    pub customer: String,
}

impl From<Order> for OrderListItem {
    fn from(order: Order) -> Self {
        let customer = order
            .profiles
            .as_ref()
            .and_then(|p| p.email.clone().or_else(|| p.username.clone()))
            .unwrap_or_else(|| "—".to_string());
        Self { order, customer }
    }
}

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub orders: Vec<OrderListItem>,
    pub statuses: [OrderStatus; 5],
}

/// Orders list page handler.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> OrdersIndexTemplate {
    let orders = match AdminService::new(state.supabase(), Some(&admin.access_token))
        .orders()
        .await
    {
        Ok(orders) => orders.into_iter().map(OrderListItem::from).collect(),
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            vec![]
        }
    };

    OrdersIndexTemplate {
        ctx,
        current_path: CURRENT_PATH,
        orders,
        statuses: OrderStatus::ALL,
    }
}

/// Change an order's status. Unknown status values are rejected before any
/// remote call.
#[instrument(skip(admin, state, session))]
pub async fn set_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    let flash = match form.status.parse::<OrderStatus>() {
        Err(e) => {
            tracing::warn!("Rejected order status: {e}");
            Flash::error("Неизвестный статус заказа")
        }
        Ok(status) => match AdminService::new(state.supabase(), Some(&admin.access_token))
            .set_order_status(id, status)
            .await
        {
            Ok(()) => Flash::success(format!("Статус заказа №{id}: {}", status.label())),
            Err(e) => {
                tracing::error!("Failed to update order {id}: {e}");
                Flash::error(e.user_message())
            }
        },
    };

    push_flash(&session, flash).await;
    Redirect::to(CURRENT_PATH)
}
