//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (banners, new arrivals, categories)
//! GET  /health                        - Health check
//! GET  /health/ready                  - Readiness (backend reachable)
//!
//! # Catalog
//! GET  /products                      - Product listing (?page, ?q, ?sort, ?category)
//! GET  /products/{id}                 - Product detail
//! GET  /categories/{id}               - Category listing
//!
//! # Cart (HTMX fragments)
//! GET  /cart                          - Cart page
//! POST /cart/add                      - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update                   - Update quantity (returns cart_items fragment)
//! POST /cart/remove                   - Remove item (returns cart_items fragment)
//! GET  /cart/count                    - Cart count badge (fragment)
//! POST /cart/coupon                   - Apply coupon (rate limited)
//! POST /cart/coupon/remove            - Remove coupon
//!
//! # Checkout
//! GET  /checkout                      - Shipping details form
//! POST /checkout                      - Place order (rate limited)
//! GET  /orders/{id}                   - Order confirmation / transfer instructions
//! GET  /orders/{id}/payment-status    - Payment polling fragment
//! ```

pub mod cart;
pub mod categories;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::{checkout_rate_limiter, coupon_rate_limiter};
use crate::state::AppState;

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route(
            "/coupon",
            post(cart::apply_coupon).layer(coupon_rate_limiter()),
        )
        .route("/coupon/remove", post(cart::remove_coupon))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(orders::show))
        .route("/{id}/payment-status", get(orders::payment_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .route("/categories/{id}", get(categories::show))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout
        .route(
            "/checkout",
            get(checkout::show).merge(post(checkout::submit).layer(checkout_rate_limiter())),
        )
        .nest("/orders", order_routes())
}
