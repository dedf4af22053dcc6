//! Order management route handlers.
//!
//! Status changes are checked by the backend. The picker only offers the
//! usual next steps; a refused transition comes back as a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use roomily_core::model::Order;
use roomily_core::{OrderId, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{AdminApiError, OrderQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::to_local_display;
use crate::middleware::RequireAdminAuth;
use crate::models::{Flash, set_flash};
use crate::routes::{Layout, Pager, SelectOption, filter_url};
use crate::state::AppState;

/// Order table filters from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<u32>,
    pub status: Option<String>,
    pub q: Option<String>,
}

/// One order table row.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub order: Order,
    pub placed_at: String,
}

impl From<Order> for OrderRow {
    fn from(order: Order) -> Self {
        Self {
            placed_at: to_local_display(order.created_at),
            order,
        }
    }
}

/// Order table template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRow>,
    pub status_options: Vec<SelectOption>,
    pub search: String,
    pub pagination: Pager,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: Order,
    pub placed_at: String,
    pub choices: Vec<OrderStatus>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Paginated order table, newest first.
#[instrument(skip(state, admin, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate> {
    // Unknown statuses are ignored rather than rejected
    let selected_status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| s.parse::<OrderStatus>().ok());
    let search = query.q.unwrap_or_default();

    let api_query = OrderQuery {
        page: query.page.unwrap_or(1).max(1),
        size: state.config().page_size,
        status: selected_status,
        search: Some(search.clone()),
    };
    let page = state.api().list_orders(&admin.token, &api_query).await?;

    let base = filter_url(
        "/orders",
        &[
            ("status", selected_status.map(|s| s.as_str().to_string())),
            ("q", Some(search.clone())),
        ],
    );

    Ok(OrdersIndexTemplate {
        layout: Layout::new(&admin, "orders", &session).await,
        pagination: Pager::new(&page, &base),
        orders: page.content.into_iter().map(OrderRow::from).collect(),
        status_options: OrderStatus::ALL
            .iter()
            .map(|status| {
                SelectOption::new(
                    status.as_str(),
                    status.label(),
                    selected_status.map_or("", OrderStatus::as_str),
                )
            })
            .collect(),
        search,
    })
}

/// Order detail with items, shipping info and the status picker.
#[instrument(skip(state, admin, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<OrderShowTemplate> {
    let order = state.api().get_order(&admin.token, id).await?;

    Ok(OrderShowTemplate {
        layout: Layout::new(&admin, "orders", &session).await,
        placed_at: to_local_display(order.created_at),
        choices: order.status.next_choices(),
        order,
    })
}

/// Move an order to a new status.
#[instrument(skip(state, admin, session, form), fields(status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown order status: {}", form.status)))?;

    let flash = match state
        .api()
        .update_order_status(&admin.token, id, status)
        .await
    {
        Ok(order) => {
            tracing::info!(
                order_id = %id,
                status = %order.status,
                admin = %admin.username,
                "Order status changed"
            );
            Flash::success(format!(
                "Order {} is now {}.",
                order.display_code(),
                order.status.label().to_lowercase()
            ))
        }
        Err(AdminApiError::Rejected(message)) => {
            tracing::info!(order_id = %id, "Status change refused: {message}");
            Flash::error(format!("Status not changed: {message}"))
        }
        Err(e) => return Err(e.into()),
    };

    set_flash(&session, flash).await?;
    Ok(Redirect::to(&format!("/orders/{id}")))
}
