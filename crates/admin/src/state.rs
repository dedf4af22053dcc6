//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{AdminApiError, AdminClient};
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    api: AdminClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, AdminApiError> {
        let api = AdminClient::new(&config.api)?;
        Ok(Self::from_parts(config, api))
    }

    /// Assemble state from an existing client.
    #[must_use]
    pub fn from_parts(config: AdminConfig, api: AdminClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, api }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the Roomily API client.
    #[must_use]
    pub fn api(&self) -> &AdminClient {
        &self.inner.api
    }
}
