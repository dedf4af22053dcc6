//! Router tests: full admin stack with a mocked Roomily API.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{body_text, form_post, get, location};

async fn mock_stats(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard/stats"))
        .and(header("Authorization", "Bearer tok-admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::stats_json()))
        .mount(server)
        .await;
}

// =============================================================================
// Health & auth
// =============================================================================

#[tokio::test]
async fn test_health_sets_admin_headers() {
    let server = MockServer::start().await;
    let response = common::app(&server)
        .oneshot(get("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-robots-tag").unwrap(),
        "noindex, nofollow"
    );
}

#[tokio::test]
async fn test_pages_require_login() {
    let server = MockServer::start().await;
    let app = common::app(&server);

    for uri in ["/", "/orders", "/products/new", "/coupons"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), Some("/auth/login"), "{uri}");
    }

    let response = app
        .oneshot(get("/api/dashboard/chart", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_stays_on_login_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let response = common::app(&server)
        .oneshot(form_post(
            "/auth/login",
            "username=mai&password=nope",
            None,
            false,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_text(response).await;
    assert!(body.contains("Invalid username or password."));
    assert!(body.contains("value=\"mai\""));
}

#[tokio::test]
async fn test_login_shows_dashboard_with_welcome() {
    let server = MockServer::start().await;
    mock_stats(&server).await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "ADMIN").await;

    let response = app
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Welcome back, Mai Tran."));
    assert!(body.contains("12.500.000"));
    assert!(body.contains("5 pending"));

    // The welcome notice is shown once
    let body = body_text(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(!body.contains("Welcome back"));

    // Logged-in admins skip the login page
    let response = app.oneshot(get("/auth/login", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_chart_endpoint_returns_scaled_series() {
    let server = MockServer::start().await;
    mock_stats(&server).await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .oneshot(get("/api/dashboard/chart", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let chart: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(chart["revenue_by_month"][1]["percent"], 100);
    assert_eq!(chart["revenue_by_month"][0]["percent"], 67);
}

#[tokio::test]
async fn test_expired_backend_token_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/dashboard/stats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "ADMIN").await;

    let response = app
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login?expired=1"));

    // The old cookie no longer carries a login
    let response = app.oneshot(get("/orders", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), Some("/auth/login"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = MockServer::start().await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .clone()
        .oneshot(form_post("/auth/logout", "", Some(&cookie), false))
        .await
        .unwrap();
    assert_eq!(location(&response), Some("/auth/login"));

    let response = app.oneshot(get("/coupons", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), Some("/auth/login"));
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_invalid_coupon_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/coupons"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .oneshot(form_post(
            "/coupons",
            "code=x%21&discount_percent=150&start_date=2026-10-31T00%3A00&end_date=2026-10-01T00%3A00",
            Some(&cookie),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(response).await;
    assert!(body.contains("Discount must be between 1 and 100 percent."));
    assert!(body.contains("End date must be after the start date."));
}

#[tokio::test]
async fn test_create_coupon_converts_store_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/coupons"))
        .and(body_partial_json(json!({
            "code": "AUTUMN10",
            "discountPercent": "10",
            "startDate": "2026-09-30T17:00:00Z",
            "endDate": "2026-10-31T16:59:00Z"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::coupon_json(7, "AUTUMN10")))
        .expect(1)
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .oneshot(form_post(
            "/coupons",
            "code=autumn10&discount_percent=10&start_date=2026-10-01T00%3A00&end_date=2026-10-31T23%3A59",
            Some(&cookie),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/coupons"));
}

#[tokio::test]
async fn test_product_table_lists_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_json(vec![
            common::product_json(1, "Linen Shirt", 250_000, 3),
            common::product_json(2, "Silk Scarf", 120_000, 0),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/categories"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([common::category_json(3, "Shirts")])),
        )
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .oneshot(get("/products?category=3", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Linen Shirt"));
    assert!(body.contains("250.000"));
    assert!(body.contains("Sold out"));
    assert!(body.contains("<option value=\"3\" selected>Shirts</option>"));
    // Staff get no delete buttons
    assert!(!body.contains("/products/1/delete"));
}

#[tokio::test]
async fn test_staff_cannot_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/coupons/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .oneshot(form_post("/coupons/7/delete", "", Some(&cookie), true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_htmx_delete_removes_row() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/coupons/7"))
        .and(header("Authorization", "Bearer tok-admin"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "ADMIN").await;

    let response = app
        .oneshot(form_post("/coupons/7/delete", "", Some(&cookie), true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_refused_delete_is_shown_in_flash_slot() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/categories/3"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "Category still has products"})),
        )
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "ADMIN").await;

    let response = app
        .clone()
        .oneshot(form_post("/categories/3/delete", "", Some(&cookie), true))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Retarget").unwrap(), "#flash");
    assert!(body_text(response).await.contains("Category still has products"));

    // Without HTMX the refusal becomes a flash and a redirect
    let response = app
        .oneshot(form_post("/categories/3/delete", "", Some(&cookie), false))
        .await
        .unwrap();
    assert_eq!(location(&response), Some("/categories"));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_order_detail_offers_next_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::order_json(42, "PENDING")))
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .oneshot(get("/orders/42", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("RM0042"));
    assert!(body.contains("12 Ly Thuong Kiet, Ha Noi"));
    assert!(body.contains("<option value=\"CONFIRMED\">Confirmed</option>"));
    assert!(!body.contains("<option value=\"DELIVERED\">"));
}

#[tokio::test]
async fn test_status_change_flashes_result() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/orders/42/status"))
        .and(body_json(json!({"status": "CONFIRMED"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::order_json(42, "CONFIRMED")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::order_json(42, "CONFIRMED")),
        )
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/orders/42/status",
            "status=CONFIRMED",
            Some(&cookie),
            false,
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), Some("/orders/42"));

    let body = body_text(app.oneshot(get("/orders/42", Some(&cookie))).await.unwrap()).await;
    assert!(body.contains("Order RM0042 is now confirmed."));
}

#[tokio::test]
async fn test_unknown_order_renders_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/orders/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let app = common::app(&server);
    let cookie = common::login(&app, &server, "STAFF").await;

    let response = app
        .oneshot(get("/orders/999", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("That record does not exist."));
}
