//! Shared helpers for storefront tests against a mocked Roomily API.

#![allow(dead_code, clippy::unwrap_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use roomily_storefront::config::StorefrontConfig;
use roomily_storefront::state::AppState;
use serde_json::{Value, json};
use wiremock::MockServer;

/// Storefront configuration pointing at the mock backend.
pub fn config(api_url: &str) -> StorefrontConfig {
    StorefrontConfig::from_lookup(|key| match key {
        "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
        "ROOMILY_API_URL" => Some(api_url.to_string()),
        "STOREFRONT_BANK_CODE" => Some("MB".to_string()),
        "STOREFRONT_BANK_ACCOUNT" => Some("0123456789".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Full storefront router backed by `server`.
pub fn app(server: &MockServer) -> Router {
    let state = AppState::new(config(&server.uri())).unwrap();
    roomily_storefront::app(state)
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

/// A one-page listing.
pub fn page_json(content: Vec<Value>) -> Value {
    let total = content.len();
    json!({
        "content": content,
        "number": 0,
        "size": 12,
        "totalElements": total,
        "totalPages": 1
    })
}

/// An order as the backend returns it.
pub fn order_json(id: i64, payment_method: &str) -> Value {
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
        "status": "PENDING",
        "paymentMethod": payment_method,
        "paymentStatus": "PENDING",
        "createdAt": "2026-10-18T08:00:00Z"
    })
}

/// A request builder with a client address for the rate limiters.
pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.10")
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
        .find(|value| value.starts_with("roomily_session="))
        .and_then(|value| value.split(';').next())
        .map(String::from)
}

/// Read a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
