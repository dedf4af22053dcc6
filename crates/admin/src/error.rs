//! Unified error handling for admin.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::api::AdminApiError;
use crate::filters;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Roomily backend call failed.
    #[error("API error: {0}")]
    Api(#[from] AdminApiError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Response extension telling the session middleware to log the admin out.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    status: u16,
    message: &'a str,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Api(err) => match err {
                AdminApiError::Unauthorized => StatusCode::UNAUTHORIZED,
                AdminApiError::Forbidden(_) => StatusCode::FORBIDDEN,
                AdminApiError::NotFound(_) => StatusCode::NOT_FOUND,
                AdminApiError::Rejected(_) => StatusCode::BAD_REQUEST,
                AdminApiError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                AdminApiError::Http(_)
                | AdminApiError::Parse(_)
                | AdminApiError::Status { .. } => StatusCode::BAD_GATEWAY,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the admin. Internal details are never exposed.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Api(AdminApiError::NotFound(_)) | Self::NotFound(_) => {
                "That record does not exist.".to_string()
            }
            Self::Api(AdminApiError::Rejected(message) | AdminApiError::Forbidden(message))
            | Self::Forbidden(message)
            | Self::BadRequest(message) => message.clone(),
            Self::Api(AdminApiError::Unauthorized) => {
                "Your session has expired, please log in again.".to_string()
            }
            Self::Api(AdminApiError::RateLimited(_)) => {
                "The backend is busy, please try again in a moment.".to_string()
            }
            Self::Api(_) => "External service error".to_string(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Whether the backend no longer accepts the admin's token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(AdminApiError::Unauthorized))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unauthorized() {
            tracing::info!("Backend rejected admin token, logging out");
            let mut response = Redirect::to("/auth/login?expired=1").into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let message = self.public_message();
        let body = ErrorTemplate {
            status: status.as_u16(),
            message: &message,
        }
        .render()
        .unwrap_or_else(|_| message.clone());

        (status, Html(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the logged-in admin.
pub fn set_sentry_user(username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
