//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; totals are recomputed on every
//! render from the line snapshots and the applied coupon.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use roomily_core::{CartTotals, CouponState, ProductId, ShippingPolicy};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::config::CURRENCY;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::{AppliedCoupon, CartLine, SessionCart};
use crate::routes::is_htmx;
use crate::state::AppState;

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub coupon: Option<AppliedCoupon>,
    /// Progress towards free shipping, 0-100.
    pub free_shipping_progress: u32,
}

impl CartView {
    /// Build the view for a cart under a shipping policy.
    #[must_use]
    pub fn new(cart: &SessionCart, policy: &ShippingPolicy) -> Self {
        let totals = cart.totals(policy, CURRENCY);
        Self {
            lines: cart.lines.clone(),
            coupon: cart.coupon.clone(),
            free_shipping_progress: shipping_progress(totals.subtotal, policy.free_threshold),
            totals,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Percentage of the free-shipping threshold reached.
fn shipping_progress(subtotal: Decimal, threshold: Option<Decimal>) -> u32 {
    let Some(threshold) = threshold.filter(|t| *t > Decimal::ZERO) else {
        return 100;
    };
    let percent = (subtotal * Decimal::ONE_HUNDRED / threshold)
        .floor()
        .min(Decimal::ONE_HUNDRED);
    u32::try_from(percent.mantissa()).unwrap_or(0)
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub coupon_error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub coupon_error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline cart message fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_message.html")]
pub struct CartMessageTemplate {
    pub message: String,
}

/// Respond with the cart fragment for HTMX, or the whole page otherwise.
fn render_cart(
    headers: &HeaderMap,
    state: &AppState,
    cart: &SessionCart,
    coupon_error: Option<String>,
) -> Response {
    let cart = CartView::new(cart, &state.config().shipping);
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate { cart, coupon_error },
        )
            .into_response()
    } else {
        CartShowTemplate { cart, coupon_error }.into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> CartShowTemplate {
    let cart = SessionCart::load(&session).await;
    CartShowTemplate {
        cart: CartView::new(&cart, &state.config().shipping),
        coupon_error: None,
    }
}

/// Add item to cart (HTMX).
///
/// Returns the count badge with an HTMX trigger so other cart widgets
/// refresh. Stock problems are retargeted to the page's message slot.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state.api().get_product(form.product_id).await?;
    let mut cart = SessionCart::load(&session).await;

    match cart.add(CartLine::from_product(&product, form.quantity.unwrap_or(1))) {
        Ok(quantity) => {
            cart.save(&session).await?;
            tracing::debug!(product_id = %product.id, quantity, "Added to cart");
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", &product.id.to_string())]),
            );

            if !is_htmx(&headers) {
                return Ok(Redirect::to("/cart").into_response());
            }
            Ok((
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate {
                    count: cart.item_count(),
                },
            )
                .into_response())
        }
        Err(e) => {
            if !is_htmx(&headers) {
                return Ok(Redirect::to(&format!("/products/{}", product.id)).into_response());
            }
            Ok((
                AppendHeaders([("HX-Retarget", "#cart-message"), ("HX-Reswap", "innerHTML")]),
                CartMessageTemplate {
                    message: e.to_string(),
                },
            )
                .into_response())
        }
    }
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    if cart.set_quantity(form.product_id, form.quantity) {
        cart.save(&session).await?;
    }
    Ok(render_cart(&headers, &state, &cart, None))
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    if cart.remove(form.product_id) {
        cart.save(&session).await?;
    }
    Ok(render_cart(&headers, &state, &cart, None))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: SessionCart::load(&session).await.item_count(),
    }
}

/// Apply a coupon after the backend accepts it for the current subtotal.
#[instrument(skip(state, session, headers, form), fields(code = %form.code.trim()))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let code = form.code.trim().to_ascii_uppercase();
    let mut cart = SessionCart::load(&session).await;

    let coupon_error = if code.is_empty() {
        Some("Enter a coupon code.".to_string())
    } else if cart.is_empty() {
        Some("Add something to your cart first.".to_string())
    } else {
        match state.api().validate_coupon(&code, cart.subtotal()).await {
            Ok(coupon) => match coupon.state_at(Utc::now()) {
                CouponState::Active => {
                    cart.coupon = Some(AppliedCoupon {
                        code: coupon.code,
                        percent: coupon.discount_percent,
                    });
                    cart.save(&session).await?;
                    tracing::info!(code = %code, "Coupon applied");
                    None
                }
                other => Some(format!(
                    "Coupon {code} is not usable ({}).",
                    other.label().to_lowercase()
                )),
            },
            Err(ApiError::Rejected(message)) => Some(message),
            Err(e) => {
                tracing::warn!("Coupon validation failed: {e}");
                Some("We couldn't check that coupon right now. Please try again.".to_string())
            }
        }
    };

    Ok(render_cart(&headers, &state, &cart, coupon_error))
}

/// Remove the applied coupon.
#[instrument(skip(state, session, headers))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    if cart.coupon.take().is_some() {
        cart.save(&session).await?;
    }
    Ok(render_cart(&headers, &state, &cart, None))
}
