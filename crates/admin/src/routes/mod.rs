//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//! GET  /health/ready                  - Readiness (backend reachable)
//!
//! # Auth
//! GET  /auth/login                    - Login page
//! POST /auth/login                    - Username/password login (rate limited)
//! POST /auth/logout                   - Logout
//!
//! # Dashboard
//! GET  /                              - Stat cards and charts
//! GET  /api/dashboard/chart           - Chart series (JSON)
//!
//! # Catalog (same shape for /categories, /coupons and /banners)
//! GET  /products                      - Table (?page, ?q, ?category)
//! GET  /products/new                  - Create form
//! POST /products                      - Create
//! GET  /products/{id}/edit            - Edit form
//! POST /products/{id}                 - Update
//! POST /products/{id}/delete          - Delete (ADMIN role only)
//!
//! # Orders
//! GET  /orders                        - Table (?page, ?status, ?q)
//! GET  /orders/{id}                   - Detail with items and shipping info
//! POST /orders/{id}/status            - Change status
//! ```

pub mod auth;
pub mod banners;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod products;

use askama::Template;
use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use roomily_core::model::Page;
use tower_sessions::Session;

use crate::api::AdminApiError;
use crate::error::Result;
use crate::filters;
use crate::middleware::login_rate_limiter;
use crate::models::{CurrentAdmin, Flash, set_flash, take_flash};
use crate::state::AppState;

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

// =============================================================================
// Shared views
// =============================================================================

/// Data every admin page layout needs.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin_name: String,
    pub role_label: &'static str,
    pub can_delete: bool,
    /// Nav section to highlight.
    pub section: &'static str,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Build the layout, consuming any pending flash.
    pub async fn new(admin: &CurrentAdmin, section: &'static str, session: &Session) -> Self {
        Self {
            admin_name: admin.display_name().to_string(),
            role_label: match admin.role {
                roomily_core::AdminRole::Admin => "Administrator",
                roomily_core::AdminRole::Staff => "Staff",
            },
            can_delete: admin.can_delete(),
            section,
            flash: take_flash(session).await,
        }
    }
}

/// Previous/next links for a paginated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    pub current: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pager {
    /// Build links from a page and the path plus filter query (without `page`).
    #[must_use]
    pub fn new<T>(page: &Page<T>, base: &str) -> Self {
        let link = |number: u32| {
            let separator = if base.contains('?') { '&' } else { '?' };
            format!("{base}{separator}page={number}")
        };
        Self {
            current: page.current(),
            total_pages: page.total_pages.max(1),
            total_elements: page.total_elements,
            prev_url: page.has_previous().then(|| link(page.current() - 1)),
            next_url: page.has_next().then(|| link(page.current() + 1)),
        }
    }
}

/// One `<option>` of a select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        Self {
            selected: !current.is_empty() && value == current.trim(),
            label: label.into(),
            value,
        }
    }
}

/// Build `path?key=value&...` from the non-empty filters.
#[must_use]
pub fn filter_url(path: &str, filters: &[(&str, Option<String>)]) -> String {
    let query: Vec<String> = filters
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{key}={}", urlencoding::encode(v)))
        })
        .collect();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", query.join("&"))
    }
}

/// Notice fragment swapped into `#flash` by HTMX.
#[derive(Template)]
#[template(path = "partials/flash.html")]
pub struct FlashTemplate {
    pub flash: Option<Flash>,
}

/// Respond to a delete request.
///
/// HTMX requests get an empty body (the row is swapped out) or, on refusal,
/// the message retargeted into `#flash`. Plain form posts get a flash and a
/// redirect to `back`.
///
/// # Errors
///
/// Propagates backend failures other than a refusal.
pub async fn delete_response(
    headers: &HeaderMap,
    session: &Session,
    result: std::result::Result<(), AdminApiError>,
    label: &str,
    back: &str,
) -> Result<Response> {
    let flash = match result {
        Ok(()) => {
            tracing::info!(record = %label, "Record deleted");
            Flash::success(format!("{label} deleted."))
        }
        Err(AdminApiError::Rejected(message) | AdminApiError::NotFound(message)) => {
            tracing::info!(record = %label, "Delete refused: {message}");
            Flash::error(format!("Could not delete {label}: {message}"))
        }
        Err(e) => return Err(e.into()),
    };

    if is_htmx(headers) {
        if flash.is_error {
            let body = FlashTemplate { flash: Some(flash) }
                .render()
                .unwrap_or_default();
            return Ok((
                StatusCode::OK,
                [("HX-Retarget", "#flash"), ("HX-Reswap", "innerHTML")],
                Html(body),
            )
                .into_response());
        }
        return Ok((StatusCode::OK, [("HX-Trigger", "record-deleted")], Html(String::new()))
            .into_response());
    }

    set_flash(session, flash).await?;
    Ok(Redirect::to(back).into_response())
}

/// Flash a success message and redirect.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn saved(session: &Session, message: String, to: &str) -> Result<Response> {
    set_flash(session, Flash::success(message)).await?;
    Ok(Redirect::to(to).into_response())
}

// =============================================================================
// Router
// =============================================================================

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route(
            "/auth/login",
            get(auth::login_page).merge(post(auth::login).layer(login_rate_limiter())),
        )
        .route("/auth/logout", post(auth::logout))
        // Dashboard
        .route("/", get(dashboard::dashboard))
        .route("/api/dashboard/chart", get(dashboard::chart))
        // Products
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new_product))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/delete", post(products::delete))
        // Categories
        .route("/categories", get(categories::index).post(categories::create))
        .route("/categories/new", get(categories::new_category))
        .route("/categories/{id}", post(categories::update))
        .route("/categories/{id}/edit", get(categories::edit))
        .route("/categories/{id}/delete", post(categories::delete))
        // Coupons
        .route("/coupons", get(coupons::index).post(coupons::create))
        .route("/coupons/new", get(coupons::new_coupon))
        .route("/coupons/{id}", post(coupons::update))
        .route("/coupons/{id}/edit", get(coupons::edit))
        .route("/coupons/{id}/delete", post(coupons::delete))
        // Banners
        .route("/banners", get(banners::index).post(banners::create))
        .route("/banners/new", get(banners::new_banner))
        .route("/banners/{id}", post(banners::update))
        .route("/banners/{id}/edit", get(banners::edit))
        .route("/banners/{id}/delete", post(banners::delete))
        // Orders
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
}
