//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, StorefrontClient};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: StorefrontClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = StorefrontClient::new(&config.api)?;
        Ok(Self::from_parts(config, api))
    }

    /// Assemble state from an existing client.
    #[must_use]
    pub fn from_parts(config: StorefrontConfig, api: StorefrontClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, api }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Roomily API client.
    #[must_use]
    pub fn api(&self) -> &StorefrontClient {
        &self.inner.api
    }
}
