//! Roomily REST API client for the admin panel.
//!
//! # Architecture
//!
//! - Plain JSON over HTTPS via `reqwest`
//! - Every call carries the logged-in admin's bearer token; the client itself
//!   holds no credentials
//! - Nothing is cached: admins must always see what the backend has
//!
//! # Example
//!
//! ```rust,ignore
//! use roomily_admin::api::{AdminClient, OrderQuery};
//!
//! let client = AdminClient::new(&config.api)?;
//! let login = client.login("mai", &password).await?;
//! let orders = client.list_orders(&login.token, &OrderQuery::default()).await?;
//! ```

mod inputs;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use roomily_core::model::{Banner, Category, Coupon, DashboardStats, ErrorBody, Order, Page, Product};
use roomily_core::{AdminRole, BannerId, CategoryId, CouponId, OrderId, OrderStatus, ProductId};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::ApiConfig;

pub use inputs::{BannerInput, CategoryInput, CouponInput, ProductInput};
use inputs::{LoginRequest, StatusUpdate};

/// Errors that can occur when talking to the Roomily backend.
#[derive(Debug, Error)]
pub enum AdminApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Token missing, expired or revoked; the admin must log in again.
    #[error("Unauthorized")]
    Unauthorized,

    /// The token is valid but the role may not do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the change (duplicate code, invalid transition, ...).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Any other non-success status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

// =============================================================================
// Responses & Queries
// =============================================================================

/// Successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(deserialize_with = "secret_string")]
    pub token: SecretString,
    pub user: AdminProfile,
}

/// The admin account behind a token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: AdminRole,
}

/// Deserialize a string straight into a [`SecretString`].
pub(crate) fn secret_string<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Order table filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    /// One-based page number.
    pub page: u32,
    pub size: u32,
    pub status: Option<OrderStatus>,
    /// Matches order code, customer name or phone.
    pub search: Option<String>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            status: None,
            search: None,
        }
    }
}

impl OrderQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.saturating_sub(1).to_string()),
            ("size", self.size.to_string()),
            ("sort", "createdAt,desc".to_string()),
        ];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        push_search(&mut params, self.search.as_deref());
        params
    }
}

/// Product table filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// One-based page number.
    pub page: u32,
    pub size: u32,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: 20,
            category_id: None,
            search: None,
        }
    }
}

impl ProductQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.saturating_sub(1).to_string()),
            ("size", self.size.to_string()),
            ("sort", "createdAt,desc".to_string()),
        ];
        if let Some(category_id) = self.category_id {
            params.push(("categoryId", category_id.to_string()));
        }
        push_search(&mut params, self.search.as_deref());
        params
    }
}

fn push_search(params: &mut Vec<(&'static str, String)>, search: Option<&str>) {
    if let Some(search) = search.map(str::trim)
        && !search.is_empty()
    {
        params.push(("search", search.to_string()));
    }
}

// =============================================================================
// AdminClient
// =============================================================================

/// Client for the authenticated Roomily REST endpoints.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdminApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, AdminApiError> {
        Self::with_base_url(config.base_url.as_str(), config.timeout)
    }

    /// Create a client against an arbitrary base URL (used with wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`AdminApiError::Http`] if the HTTP client cannot be built, or
    /// [`AdminApiError::Status`] if `base_url` is not a valid URL.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, AdminApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("roomily-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| AdminApiError::Status {
            code: 0,
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            inner: Arc::new(AdminClientInner { client, base_url }),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, AdminApiError> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| AdminApiError::Status {
                code: 0,
                message: format!("invalid path '{path}': {e}"),
            })?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .header("Accept", "application/json"))
    }

    /// Build a request carrying the admin's bearer token.
    fn authed(
        &self,
        method: Method,
        path: &str,
        token: &SecretString,
    ) -> Result<RequestBuilder, AdminApiError> {
        Ok(self.request(method, path)?.bearer_auth(token.expose_secret()))
    }

    /// Send a request and return the raw body of a successful response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, AdminApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(AdminApiError::RateLimited(retry_after));
        }

        let path = response.url().path().to_string();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(error_for_status(status, &path, &body))
        }
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AdminApiError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Roomily API response"
            );
            AdminApiError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), AdminApiError> {
        self.execute(request).await.map(|_| ())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AdminApiError::Unauthorized`] for wrong credentials.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, AdminApiError> {
        let request = self.request(Method::POST, "api/auth/login")?.json(&LoginRequest {
            username,
            password: password.expose_secret(),
        });

        // Bad credentials come back as 400 on some deployments
        match self.send(request).await {
            Err(AdminApiError::Rejected(_)) => Err(AdminApiError::Unauthorized),
            other => other,
        }
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Aggregate numbers for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn stats(&self, token: &SecretString) -> Result<DashboardStats, AdminApiError> {
        let request = self.authed(Method::GET, "api/admin/dashboard/stats", token)?;
        self.send(request).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// One page of products, including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(page = query.page))]
    pub async fn list_products(
        &self,
        token: &SecretString,
        query: &ProductQuery,
    ) -> Result<Page<Product>, AdminApiError> {
        let request = self
            .authed(Method::GET, "api/admin/products", token)?
            .query(&query.params());
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::NotFound`] for unknown IDs.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<Product, AdminApiError> {
        let request = self.authed(Method::GET, &format!("api/admin/products/{id}"), token)?;
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] when the backend refuses the payload.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        input: &ProductInput,
    ) -> Result<Product, AdminApiError> {
        let request = self
            .authed(Method::POST, "api/admin/products", token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] when the backend refuses the payload.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, AdminApiError> {
        let request = self
            .authed(Method::PUT, &format!("api/admin/products/{id}"), token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] if the product is referenced by orders.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<(), AdminApiError> {
        let request = self.authed(Method::DELETE, &format!("api/admin/products/{id}"), token)?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_categories(
        &self,
        token: &SecretString,
    ) -> Result<Vec<Category>, AdminApiError> {
        let request = self.authed(Method::GET, "api/admin/categories", token)?;
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::NotFound`] for unknown IDs.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn get_category(
        &self,
        token: &SecretString,
        id: CategoryId,
    ) -> Result<Category, AdminApiError> {
        let request = self.authed(Method::GET, &format!("api/admin/categories/{id}"), token)?;
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] for duplicate names.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        token: &SecretString,
        input: &CategoryInput,
    ) -> Result<Category, AdminApiError> {
        let request = self
            .authed(Method::POST, "api/admin/categories", token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] for duplicate names.
    #[instrument(skip(self, token, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        token: &SecretString,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, AdminApiError> {
        let request = self
            .authed(Method::PUT, &format!("api/admin/categories/{id}"), token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] while products still use the category.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        token: &SecretString,
        id: CategoryId,
    ) -> Result<(), AdminApiError> {
        let request = self.authed(Method::DELETE, &format!("api/admin/categories/{id}"), token)?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_coupons(&self, token: &SecretString) -> Result<Vec<Coupon>, AdminApiError> {
        let request = self.authed(Method::GET, "api/admin/coupons", token)?;
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::NotFound`] for unknown IDs.
    #[instrument(skip(self, token), fields(coupon_id = %id))]
    pub async fn get_coupon(
        &self,
        token: &SecretString,
        id: CouponId,
    ) -> Result<Coupon, AdminApiError> {
        let request = self.authed(Method::GET, &format!("api/admin/coupons/{id}"), token)?;
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] for duplicate codes.
    #[instrument(skip(self, token, input), fields(code = %input.code))]
    pub async fn create_coupon(
        &self,
        token: &SecretString,
        input: &CouponInput,
    ) -> Result<Coupon, AdminApiError> {
        let request = self
            .authed(Method::POST, "api/admin/coupons", token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] for duplicate codes.
    #[instrument(skip(self, token, input), fields(coupon_id = %id, code = %input.code))]
    pub async fn update_coupon(
        &self,
        token: &SecretString,
        id: CouponId,
        input: &CouponInput,
    ) -> Result<Coupon, AdminApiError> {
        let request = self
            .authed(Method::PUT, &format!("api/admin/coupons/{id}"), token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(coupon_id = %id))]
    pub async fn delete_coupon(
        &self,
        token: &SecretString,
        id: CouponId,
    ) -> Result<(), AdminApiError> {
        let request = self.authed(Method::DELETE, &format!("api/admin/coupons/{id}"), token)?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Banners
    // =========================================================================

    /// Every banner, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_banners(&self, token: &SecretString) -> Result<Vec<Banner>, AdminApiError> {
        let request = self.authed(Method::GET, "api/admin/banners", token)?;
        let mut banners: Vec<Banner> = self.send(request).await?;
        banners.sort_by_key(|banner| banner.position);
        Ok(banners)
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::NotFound`] for unknown IDs.
    #[instrument(skip(self, token), fields(banner_id = %id))]
    pub async fn get_banner(
        &self,
        token: &SecretString,
        id: BannerId,
    ) -> Result<Banner, AdminApiError> {
        let request = self.authed(Method::GET, &format!("api/admin/banners/{id}"), token)?;
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] when the backend refuses the payload.
    #[instrument(skip(self, token, input), fields(title = %input.title))]
    pub async fn create_banner(
        &self,
        token: &SecretString,
        input: &BannerInput,
    ) -> Result<Banner, AdminApiError> {
        let request = self
            .authed(Method::POST, "api/admin/banners", token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] when the backend refuses the payload.
    #[instrument(skip(self, token, input), fields(banner_id = %id))]
    pub async fn update_banner(
        &self,
        token: &SecretString,
        id: BannerId,
        input: &BannerInput,
    ) -> Result<Banner, AdminApiError> {
        let request = self
            .authed(Method::PUT, &format!("api/admin/banners/{id}"), token)?
            .json(input);
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(banner_id = %id))]
    pub async fn delete_banner(
        &self,
        token: &SecretString,
        id: BannerId,
    ) -> Result<(), AdminApiError> {
        let request = self.authed(Method::DELETE, &format!("api/admin/banners/{id}"), token)?;
        self.send_empty(request).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// One page of orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(page = query.page, status = ?query.status))]
    pub async fn list_orders(
        &self,
        token: &SecretString,
        query: &OrderQuery,
    ) -> Result<Page<Order>, AdminApiError> {
        let request = self
            .authed(Method::GET, "api/admin/orders", token)?
            .query(&query.params());
        self.send(request).await
    }

    /// # Errors
    ///
    /// Returns [`AdminApiError::NotFound`] for unknown IDs.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &SecretString, id: OrderId) -> Result<Order, AdminApiError> {
        let request = self.authed(Method::GET, &format!("api/admin/orders/{id}"), token)?;
        self.send(request).await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns [`AdminApiError::Rejected`] when the backend refuses the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &SecretString,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminApiError> {
        let request = self
            .authed(Method::PUT, &format!("api/admin/orders/{id}/status"), token)?
            .json(&StatusUpdate { status });
        self.send(request).await
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), AdminApiError> {
        let request = self.request(Method::GET, "api/categories")?;
        self.send_empty(request).await
    }
}

/// Map a non-success response to an error.
fn error_for_status(status: StatusCode, path: &str, body: &str) -> AdminApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message);

    match status {
        StatusCode::UNAUTHORIZED => AdminApiError::Unauthorized,
        StatusCode::FORBIDDEN => AdminApiError::Forbidden(
            message.unwrap_or_else(|| "You do not have permission to do that".to_string()),
        ),
        StatusCode::NOT_FOUND => {
            AdminApiError::NotFound(message.unwrap_or_else(|| path.to_string()))
        }
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            AdminApiError::Rejected(message.unwrap_or_else(|| "Request was rejected".to_string()))
        }
        _ => {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Roomily API returned non-success status"
            );
            AdminApiError::Status {
                code: status.as_u16(),
                message: message.unwrap_or_else(|| status.to_string()),
            }
        }
    }
}
