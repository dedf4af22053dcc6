//! Router tests: full storefront stack with a mocked Roomily API.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::{StatusCode, header};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{body_text, form_post, get, session_cookie};

async fn mock_product(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/products/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::product_json(1, "Linen Shirt", 250_000, 3)),
        )
        .mount(server)
        .await;
}

/// Add two shirts to a new session and return its cookie.
async fn cart_with_shirts(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(form_post("/cart/add", "product_id=1&quantity=2", None, true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).expect("session cookie")
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let response = common::app(&server)
        .oneshot(get("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(
        response
            .headers()
            .contains_key(header::CONTENT_SECURITY_POLICY)
    );
}

#[tokio::test]
async fn test_readiness_follows_backend() {
    let server = MockServer::start().await;
    let app = common::app(&server);

    let response = app.clone().oneshot(get("/health/ready", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = app.oneshot(get("/health/ready", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_product_listing_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_json(vec![
            common::product_json(1, "Linen Shirt", 250_000, 3),
            common::product_json(2, "Silk Scarf", 120_000, 0),
        ])))
        .mount(&server)
        .await;
    mock_product(&server).await;
    let app = common::app(&server);

    let response = app.clone().oneshot(get("/products", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("250.000"));
    assert!(body.contains("Sold out"));

    let response = app.oneshot(get("/products/1", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Add to cart"));
}

#[tokio::test]
async fn test_missing_product_renders_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = common::app(&server)
        .oneshot(get("/products/999", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_updates_badge_and_page() {
    let server = MockServer::start().await;
    mock_product(&server).await;
    let app = common::app(&server);

    let response = app
        .clone()
        .oneshot(form_post("/cart/add", "product_id=1&quantity=2", None, true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["HX-Trigger"], "cart-updated");
    let cookie = session_cookie(&response).unwrap();
    assert!(body_text(response).await.contains('2'));

    let response = app.oneshot(get("/cart", Some(&cookie))).await.unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("500.000"));
}

#[tokio::test]
async fn test_add_beyond_stock_shows_message() {
    let server = MockServer::start().await;
    mock_product(&server).await;
    let app = common::app(&server);
    let cookie = cart_with_shirts(&app).await;

    // Capped at the three in stock
    let response = app
        .clone()
        .oneshot(form_post("/cart/add", "product_id=1&quantity=5", Some(&cookie), true))
        .await
        .unwrap();
    assert_eq!(response.headers()["HX-Trigger"], "cart-updated");
    assert!(body_text(response).await.contains('3'));

    let response = app
        .oneshot(form_post("/cart/add", "product_id=1", Some(&cookie), true))
        .await
        .unwrap();
    assert_eq!(response.headers()["HX-Retarget"], "#cart-message");
    assert!(body_text(response).await.contains("only 3 of Linen Shirt available"));
}

#[tokio::test]
async fn test_remove_last_item_empties_cart() {
    let server = MockServer::start().await;
    mock_product(&server).await;
    let app = common::app(&server);
    let cookie = cart_with_shirts(&app).await;

    let response = app
        .oneshot(form_post("/cart/remove", "product_id=1", Some(&cookie), true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_apply_coupon() {
    let server = MockServer::start().await;
    mock_product(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .and(body_partial_json(json!({"code": "SALE10"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "code": "SALE10",
            "discountPercent": 10
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .and(body_partial_json(json!({"code": "OLD"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Coupon has expired"})),
        )
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = cart_with_shirts(&app).await;

    let response = app
        .clone()
        .oneshot(form_post("/cart/coupon", "code=old", Some(&cookie), true))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Coupon has expired"));

    let response = app
        .oneshot(form_post("/cart/coupon", "code=+sale10+", Some(&cookie), true))
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("SALE10"));
    // 10% of 500.000, shipping free above the threshold
    assert!(body.contains("-50.000"));
    assert!(body.contains("450.000"));
}

// =============================================================================
// Checkout & orders
// =============================================================================

#[tokio::test]
async fn test_checkout_requires_items() {
    let server = MockServer::start().await;
    let response = common::app(&server)
        .oneshot(get("/checkout", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/cart");
}

#[tokio::test]
async fn test_checkout_rejects_invalid_details() {
    let server = MockServer::start().await;
    mock_product(&server).await;
    let app = common::app(&server);
    let cookie = cart_with_shirts(&app).await;

    let response = app
        .oneshot(form_post(
            "/checkout",
            "customer_name=&phone=12&address=&payment_method=COD",
            Some(&cookie),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(response).await;
    assert!(body.contains("Please enter your name."));
    assert!(body.contains("Please enter a delivery address."));
}

#[tokio::test]
async fn test_checkout_drops_coupon_rejected_at_checkout() {
    let server = MockServer::start().await;
    mock_product(&server).await;
    // Valid when applied to the cart, used up by the time of checkout
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "code": "SALE10",
            "discountPercent": 10
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "Coupon has been used up"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::order_json(77, "COD")))
        .expect(0)
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = cart_with_shirts(&app).await;

    let response = app
        .clone()
        .oneshot(form_post("/cart/coupon", "code=sale10", Some(&cookie), true))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("-50.000"));

    let response = app
        .clone()
        .oneshot(form_post(
            "/checkout",
            "customer_name=Nguyen+Lan&phone=0901234567&address=12+Ly+Thuong+Kiet&payment_method=COD",
            Some(&cookie),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("Coupon has been used up"));

    let response = app.oneshot(get("/cart", Some(&cookie))).await.unwrap();
    let body = body_text(response).await;
    assert!(!body.contains("SALE10"));
    assert!(!body.contains("-50.000"));
    assert!(body.contains("500.000"));
}

#[tokio::test]
async fn test_checkout_places_order_and_polls_payment() {
    let server = MockServer::start().await;
    mock_product(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(common::order_json(77, "BANK_TRANSFER")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/77"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::order_json(77, "BANK_TRANSFER")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/77/payment-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orderId": 77,
            "paymentStatus": "PAID"
        })))
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = cart_with_shirts(&app).await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/checkout",
            "customer_name=Nguyen+Lan&phone=0901234567&address=12+Ly+Thuong+Kiet&payment_method=BANK_TRANSFER",
            Some(&cookie),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/orders/77");

    let response = app
        .clone()
        .oneshot(get("/orders/77", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("RM0077"));
    assert!(body.contains("img.vietqr.io/image/MB-0123456789"));
    assert!(body.contains("/orders/77/payment-status"));

    let response = app
        .clone()
        .oneshot(get("/orders/77/payment-status", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.headers()["HX-Redirect"], "/orders/77");

    // The cart was emptied
    let response = app.oneshot(get("/cart", Some(&cookie))).await.unwrap();
    assert!(body_text(response).await.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_orders_are_private_to_their_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders/77"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::order_json(77, "COD")),
        )
        .expect(0)
        .mount(&server)
        .await;

    let response = common::app(&server)
        .oneshot(get("/orders/77", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
