//! Authentication middleware and extractors for admin.
//!
//! Provides extractors for requiring admin authentication in route handlers.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{SessionExpired, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page
/// for HTML requests, or 401 Unauthorized for API requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name())
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

async fn current_admin(parts: &Parts) -> Result<CurrentAdmin, AdminAuthRejection> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;

    let admin: CurrentAdmin = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| {
            if parts.uri.path().starts_with("/api/") {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            }
        })?;

    tracing::Span::current().record("admin", admin.username.as_str());
    set_sentry_user(&admin.username);
    Ok(admin)
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts).await.map(Self)
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdminAuth`, this does not reject the request if the admin is not logged in.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Extractor that requires the `ADMIN` role.
///
/// Staff accounts get 403 Forbidden. Used on destructive routes.
pub struct RequireFullAdmin(pub CurrentAdmin);

/// Error returned when the `ADMIN` role is required.
#[derive(Debug)]
pub enum FullAdminRejection {
    /// Not logged in.
    Auth(AdminAuthRejection),
    /// Logged in as staff.
    Forbidden,
}

impl IntoResponse for FullAdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(rejection) => rejection.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only administrators can delete records",
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireFullAdmin
where
    S: Send + Sync,
{
    type Rejection = FullAdminRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts)
            .await
            .map_err(FullAdminRejection::Auth)?;

        if !admin.can_delete() {
            tracing::warn!(admin = %admin.username, "Staff account attempted a delete");
            return Err(FullAdminRejection::Forbidden);
        }

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// The session ID is cycled to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    clear_sentry_user();
    session.flush().await
}

/// Log the admin out when a handler reports that the backend rejected the token.
///
/// Must run inside the session layer.
pub async fn expire_session_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    if response.extensions().get::<SessionExpired>().is_some()
        && let Err(e) = clear_current_admin(&session).await
    {
        tracing::error!("Failed to clear expired admin session: {e}");
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request as HttpRequest;
    use roomily_core::AdminRole;
    use secrecy::SecretString;
    use tower_sessions::MemoryStore;

    use super::*;

    fn parts_with_session(path: &str, session: Session) -> Parts {
        let (mut parts, ()) = HttpRequest::get(path).body(()).unwrap().into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn admin(role: AdminRole) -> CurrentAdmin {
        CurrentAdmin {
            username: "mai".to_string(),
            full_name: "Mai Tran".to_string(),
            role,
            token: SecretString::from("tok"),
        }
    }

    #[tokio::test]
    async fn test_missing_admin_redirects_pages_and_rejects_api() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let mut parts = parts_with_session("/orders", session.clone());
        let rejection = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AdminAuthRejection::RedirectToLogin));

        let mut parts = parts_with_session("/api/dashboard/chart", session);
        let rejection = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AdminAuthRejection::Unauthorized));
    }

    #[tokio::test]
    async fn test_staff_cannot_delete() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session
            .insert(session_keys::CURRENT_ADMIN, admin(AdminRole::Staff))
            .await
            .unwrap();

        let mut parts = parts_with_session("/coupons/1/delete", session.clone());
        assert!(RequireAdminAuth::from_request_parts(&mut parts, &()).await.is_ok());

        let mut parts = parts_with_session("/coupons/1/delete", session);
        let rejection = RequireFullAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, FullAdminRejection::Forbidden));
    }
}
