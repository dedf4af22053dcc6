//! Shared helpers for admin tests against a mocked Roomily API.

#![allow(dead_code, clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use roomily_admin::config::AdminConfig;
use roomily_admin::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bearer token the mock backend hands out.
pub const TOKEN: &str = "tok-admin";

/// Admin configuration pointing at the mock backend.
pub fn config(api_url: &str) -> AdminConfig {
    AdminConfig::from_lookup(|key| match key {
        "ADMIN_BASE_URL" => Some("http://localhost:3001".to_string()),
        "ROOMILY_API_URL" => Some(api_url.to_string()),
        _ => None,
    })
    .unwrap()
}

/// Full admin router backed by `server`.
pub fn app(server: &MockServer) -> Router {
    let state = AppState::new(config(&server.uri())).unwrap();
    roomily_admin::app(state)
}

/// Make `POST /api/auth/login` accept `username` with the given role.
pub async fn mock_login(server: &MockServer, username: &str, role: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({"username": username})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": TOKEN,
            "user": {"username": username, "fullName": "Mai Tran", "role": role}
        })))
        .mount(server)
        .await;
}

/// Log in through the form and return the session cookie.
pub async fn login(app: &Router, server: &MockServer, role: &str) -> String {
    let username = role.to_ascii_lowercase();
    mock_login(server, &username, role).await;

    let response = app
        .clone()
        .oneshot(form_post(
            "/auth/login",
            &format!("username={username}&password=secret"),
            None,
            false,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response).expect("session cookie")
}

/// A product as the backend returns it.
pub fn product_json(id: i64, name: &str, price: u64, stock: u32) -> Value {
    json!({
        "id": id,
        "name": name,
        "price": price,
        "stock": stock,
        "images": [format!("https://cdn.roomily.tech/p/{id}.jpg")],
        "size": "M",
        "category": {"id": 3, "name": "Shirts"},
        "active": true
    })
}

pub fn category_json(id: i64, name: &str) -> Value {
    json!({"id": id, "name": name, "productCount": 4})
}

pub fn coupon_json(id: i64, code: &str) -> Value {
    json!({
        "id": id,
        "code": code,
        "discountPercent": 10,
        "usageLimit": 100,
        "usedCount": 3
    })
}

/// A one-page listing.
pub fn page_json(content: Vec<Value>) -> Value {
    let total = content.len();
    json!({
        "content": content,
        "number": 0,
        "size": 20,
        "totalElements": total,
        "totalPages": 1
    })
}

/// An order as the backend returns it.
pub fn order_json(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "orderCode": format!("RM{id:04}"),
        "customerName": "Nguyen Lan",
        "phone": "0901234567",
        "address": "12 Ly Thuong Kiet, Ha Noi",
        "items": [{
            "productId": 1,
            "productName": "Linen Shirt",
            "price": 250000,
            "quantity": 2
        }],
        "subtotal": 500000,
        "shippingFee": 0,
        "totalAmount": 500000,
        "status": status,
        "paymentMethod": "COD",
        "paymentStatus": "PENDING",
        "createdAt": "2026-10-18T08:00:00Z"
    })
}

pub fn stats_json() -> Value {
    json!({
        "totalRevenue": 12500000,
        "totalOrders": 42,
        "totalProducts": 120,
        "totalCustomers": 37,
        "ordersByStatus": [
            {"status": "PENDING", "count": 5},
            {"status": "DELIVERED", "count": 30}
        ],
        "revenueByMonth": [
            {"month": "09/2026", "revenue": 5000000, "orders": 15},
            {"month": "10/2026", "revenue": 7500000, "orders": 27}
        ]
    })
}

/// A request builder with a client address for the login rate limiter.
pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.20")
}

/// A form POST, optionally carrying a session cookie and the HTMX header.
pub fn form_post(uri: &str, body: &str, cookie: Option<&str>, htmx: bool) -> Request<Body> {
    let mut builder = request("POST", uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A GET, optionally carrying a session cookie.
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = request("GET", uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// The `name=value` part of the session cookie set by a response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("roomily_admin_session="))
        .and_then(|value| value.split(';').next())
        .map(String::from)
}

/// The redirect target of a response.
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Read a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
