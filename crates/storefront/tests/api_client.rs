//! Tests for `StorefrontClient` against a mocked Roomily API.

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use roomily_core::model::{NewOrder, NewOrderItem};
use roomily_core::{OrderId, PaymentMethod, PaymentStatus, ProductId};
use roomily_storefront::api::{ApiError, ProductQuery, ProductSort, StorefrontClient};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> StorefrontClient {
    StorefrontClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_list_products_sends_backend_paging_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("page", "1"))
        .and(query_param("size", "12"))
        .and(query_param("sort", "price,desc"))
        .and(query_param("search", "linen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_json(vec![
            common::product_json(1, "Linen Shirt", 250_000, 3),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let query = ProductQuery {
        page: 2,
        search: Some("linen".to_string()),
        sort: ProductSort::PriceDesc,
        ..ProductQuery::default()
    };

    let page = api.list_products(&query).await.unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].name, "Linen Shirt");
    assert_eq!(page.content[0].price, Decimal::new(250000, 0));

    // Served from cache; the mock expects exactly one call
    let again = api.list_products(&query).await.unwrap();
    assert_eq!(again.content[0].id, ProductId::new(1));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Product not found"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .get_product(ProductId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(m) if m == "Product not found"));
}

#[tokio::test]
async fn test_active_banners_are_filtered_and_ordered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/banners/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Autumn", "imageUrl": "https://cdn/a.jpg", "position": 2},
            {"id": 2, "title": "Old", "imageUrl": "https://cdn/b.jpg", "position": 0, "active": false},
            {"id": 3, "title": "Denim", "imageUrl": "https://cdn/c.jpg", "position": 1}
        ])))
        .mount(&server)
        .await;

    let banners = client(&server).list_active_banners().await.unwrap();
    let titles: Vec<_> = banners.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Denim", "Autumn"]);
}

#[tokio::test]
async fn test_coupon_rejection_carries_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .and(body_partial_json(json!({"code": "MIN500"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            json!({"message": "Order amount must be at least 500.000 ₫"}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .and(body_partial_json(json!({"code": "NOPE"})))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = client(&server);

    let err = api.validate_coupon("MIN500", Decimal::new(200000, 0)).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(m) if m.starts_with("Order amount")));

    let err = api.validate_coupon("NOPE", Decimal::new(200000, 0)).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(m) if m == "Coupon NOPE does not exist"));
}

#[tokio::test]
async fn test_create_order_posts_camel_case_and_refreshes_stock() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::product_json(1, "Linen Shirt", 250_000, 3)),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(body_partial_json(json!({
            "customerName": "Nguyen Lan",
            "paymentMethod": "BANK_TRANSFER",
            "items": [{"productId": 1, "quantity": 2}]
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(common::order_json(77, "BANK_TRANSFER")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    api.get_product(ProductId::new(1)).await.unwrap();

    let order = api
        .create_order(&NewOrder {
            customer_name: "Nguyen Lan".to_string(),
            phone: "0901234567".to_string(),
            email: None,
            address: "12 Ly Thuong Kiet, Ha Noi".to_string(),
            note: None,
            payment_method: PaymentMethod::BankTransfer,
            coupon_code: None,
            items: vec![NewOrderItem {
                product_id: ProductId::new(1),
                quantity: 2,
            }],
        })
        .await
        .unwrap();
    assert_eq!(order.id, OrderId::new(77));
    assert!(order.awaits_transfer());

    // The cached product was invalidated, so this hits the backend again
    api.get_product(ProductId::new(1)).await.unwrap();
}

#[tokio::test]
async fn test_out_of_stock_order_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": "Linen Shirt is out of stock"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .create_order(&NewOrder {
            customer_name: "Lan".to_string(),
            phone: "0901234567".to_string(),
            email: None,
            address: "Ha Noi".to_string(),
            note: None,
            payment_method: PaymentMethod::Cod,
            coupon_code: None,
            items: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected(m) if m == "Linen Shirt is out of stock"));
}

#[tokio::test]
async fn test_rejected_order_refreshes_cached_stock() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::product_json(1, "Linen Shirt", 250_000, 3)),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"error": "Linen Shirt is out of stock"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    api.get_product(ProductId::new(1)).await.unwrap();
    // Served from cache
    api.get_product(ProductId::new(1)).await.unwrap();

    let err = api
        .create_order(&NewOrder {
            customer_name: "Lan".to_string(),
            phone: "0901234567".to_string(),
            email: None,
            address: "Ha Noi".to_string(),
            note: None,
            payment_method: PaymentMethod::Cod,
            coupon_code: None,
            items: vec![NewOrderItem {
                product_id: ProductId::new(1),
                quantity: 3,
            }],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected(_)));

    // Stale stock was dropped, so the next read goes to the backend
    api.get_product(ProductId::new(1)).await.unwrap();
}

#[tokio::test]
async fn test_payment_status_and_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/orders/77/payment-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orderId": 77,
            "paymentStatus": "PAID",
            "orderStatus": "CONFIRMED"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/orders/78/payment-status"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let api = client(&server);

    let status = api.payment_status(OrderId::new(77)).await.unwrap();
    assert_eq!(status.payment_status, PaymentStatus::Paid);

    let err = api.payment_status(OrderId::new(78)).await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(7)));
}

#[tokio::test]
async fn test_server_errors_map_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client(&server).ping().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { code: 503, .. }));
}
