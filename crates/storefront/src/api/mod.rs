//! Roomily REST API client for the storefront.
//!
//! # Architecture
//!
//! - Plain JSON over HTTPS via `reqwest`; the backend owns stock, coupon
//!   rules and the order lifecycle
//! - In-memory caching via `moka` for catalog reads (5 minute TTL)
//! - Orders, coupon checks and payment status are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use roomily_storefront::api::{ProductQuery, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.api)?;
//! let page = client.list_products(&ProductQuery::default()).await?;
//! let product = client.get_product(page.content[0].id).await?;
//! ```

mod cache;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use roomily_core::model::{
    Banner, Category, Coupon, ErrorBody, NewOrder, Order, Page, PaymentStatusResponse, Product,
};
use roomily_core::{CategoryId, OrderId, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ApiConfig;

use cache::{CacheKey, CacheValue};

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Errors that can occur when talking to the Roomily backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the request (invalid coupon, out of stock, ...).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Any other non-success status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl ApiError {
    /// Message safe to show to shoppers, if the backend provided one.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl ProductSort {
    /// Every option, in menu order.
    pub const ALL: [Self; 3] = [Self::Newest, Self::PriceAsc, Self::PriceDesc];

    /// Value used in storefront URLs.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
        }
    }

    /// Backend `sort` parameter.
    const fn as_param(self) -> &'static str {
        match self {
            Self::Newest => "createdAt,desc",
            Self::PriceAsc => "price,asc",
            Self::PriceDesc => "price,desc",
        }
    }

    /// Parse a URL value, defaulting to newest first.
    #[must_use]
    pub fn from_slug(slug: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|sort| Some(sort.slug()) == slug)
            .unwrap_or_default()
    }
}

/// Product listing filters.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ProductQuery {
    /// One-based page number.
    pub page: u32,
    pub size: u32,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub sort: ProductSort,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            category_id: None,
            search: None,
            sort: ProductSort::default(),
        }
    }
}

impl ProductQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.saturating_sub(1).to_string()),
            ("size", self.size.to_string()),
            ("sort", self.sort.as_param().to_string()),
        ];
        if let Some(category_id) = self.category_id {
            params.push(("categoryId", category_id.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            params.push(("search", search.to_string()));
        }
        params
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CouponCheck<'a> {
    code: &'a str,
    order_amount: Decimal,
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the public Roomily REST endpoints.
///
/// Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl StorefrontClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config.base_url.as_str(), config.timeout)
    }

    /// Create a client against an arbitrary base URL (used with wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built, or
    /// [`ApiError::Status`] if `base_url` is not a valid URL.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("roomily-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                base_url: normalize_base_url(base_url)?,
                cache,
            }),
        })
    }

    /// Build a request for a path relative to the base URL.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path).map_err(|e| ApiError::Status {
            code: 0,
            message: format!("invalid path '{path}': {e}"),
        })?;
        Ok(self.inner.client.request(method, url))
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.header("Accept", "application/json").send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let path = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status, &path, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Roomily API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products, newest first by default.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page, category_id = ?query.category_id))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let key = CacheKey::Products(query.clone());
        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let request = self.request(Method::GET, "api/products")?.query(&query.params());
        let page: Page<Product> = self.send(request).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(page.clone()))
            .await;
        Ok(page)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown IDs.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self.request(Method::GET, &format!("api/products/{id}"))?;
        let product: Product = self.send(request).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.request(Method::GET, "api/categories")?;
        let categories: Vec<Category> = self.send(request).await?;

        self.inner
            .cache
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Active hero banners, ordered by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_active_banners(&self) -> Result<Vec<Banner>, ApiError> {
        if let Some(CacheValue::Banners(banners)) = self.inner.cache.get(&CacheKey::Banners).await {
            debug!("Cache hit for banners");
            return Ok(banners);
        }

        let request = self.request(Method::GET, "api/banners/active")?;
        let mut banners: Vec<Banner> = self.send(request).await?;
        banners.retain(|banner| banner.active);
        banners.sort_by_key(|banner| banner.position);

        self.inner
            .cache
            .insert(CacheKey::Banners, CacheValue::Banners(banners.clone()))
            .await;
        Ok(banners)
    }

    // =========================================================================
    // Coupons & Orders
    // =========================================================================

    /// Ask the backend whether a coupon applies to an order amount.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the code is unknown, expired,
    /// exhausted or below its minimum, with the backend's message.
    #[instrument(skip(self), fields(code = %code, order_amount = %order_amount))]
    pub async fn validate_coupon(
        &self,
        code: &str,
        order_amount: Decimal,
    ) -> Result<Coupon, ApiError> {
        let request = self
            .request(Method::POST, "api/coupons/validate")?
            .json(&CouponCheck { code, order_amount });

        match self.send(request).await {
            Err(ApiError::NotFound(_)) => Err(ApiError::Rejected(format!(
                "Coupon {code} does not exist"
            ))),
            other => other,
        }
    }

    /// Place an order.
    ///
    /// Cached copies of the ordered products are dropped so stock is re-read,
    /// whether the order is placed or rejected by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the backend refuses the order
    /// (out of stock, invalid coupon, ...).
    #[instrument(skip(self, order), fields(items = order.items.len(), payment_method = ?order.payment_method))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let request = self.request(Method::POST, "api/orders")?.json(order);
        let result: Result<Order, ApiError> = self.send(request).await;

        // A rejection is usually stale stock, so both outcomes re-read it.
        if matches!(result, Ok(_) | Err(ApiError::Rejected(_))) {
            for item in &order.items {
                self.inner
                    .cache
                    .invalidate(&CacheKey::Product(item.product_id))
                    .await;
            }
        }
        let created = result?;

        tracing::info!(order_id = %created.id, total = %created.total_amount, "Order placed");
        Ok(created)
    }

    /// Fetch an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for unknown IDs.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, ApiError> {
        let request = self.request(Method::GET, &format!("api/orders/{id}"))?;
        self.send(request).await
    }

    /// Current payment status of an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn payment_status(&self, id: OrderId) -> Result<PaymentStatusResponse, ApiError> {
        let request = self.request(Method::GET, &format!("api/orders/{id}/payment-status"))?;
        self.send(request).await
    }

    /// Check that the backend answers, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), ApiError> {
        let request = self.request(Method::GET, "api/categories")?;
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Ensure the base URL ends with exactly one slash so `join` appends.
fn normalize_base_url(base_url: &str) -> Result<Url, ApiError> {
    let normalized = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalized).map_err(|e| ApiError::Status {
        code: 0,
        message: format!("invalid base URL '{base_url}': {e}"),
    })
}

/// Map a non-success response to an error.
fn error_for_status(status: StatusCode, path: &str, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message);

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message.unwrap_or_else(|| path.to_string())),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Rejected(message.unwrap_or_else(|| "Request was rejected".to_string()))
        }
        _ => {
            tracing::error!(
                status = %status,
                path = %path,
                body = %body.chars().take(500).collect::<String>(),
                "Roomily API returned non-success status"
            );
            ApiError::Status {
                code: status.as_u16(),
                message: message.unwrap_or_else(|| status.to_string()),
            }
        }
    }
}
