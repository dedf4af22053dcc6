//! Authentication route handlers.
//!
//! Credentials are checked by the backend; the admin panel only keeps the
//! returned bearer token in the server-side session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{AdminApiError, secret_string};
use crate::error::{Result, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Flash, set_flash};
use crate::state::AppState;

/// Login form submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(deserialize_with = "secret_string")]
    pub password: SecretString,
}

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    /// Set when the backend rejected the previous token.
    pub expired: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub username: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl LoginTemplate {
    fn failed(username: String, status: StatusCode, error: &str) -> Response {
        (
            status,
            Self {
                username,
                error: Some(error.to_string()),
                notice: None,
            },
        )
            .into_response()
    }
}

/// Display the login page.
#[instrument(skip(admin))]
pub async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        username: String::new(),
        error: None,
        notice: query
            .expired
            .is_some()
            .then(|| "Your session has expired, please log in again.".to_string()),
    }
    .into_response()
}

/// Exchange credentials for a backend token and start a session.
#[instrument(skip(state, session, form), fields(username = %form.username.trim()))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let username = form.username.trim().to_string();
    if username.is_empty() || form.password.expose_secret().is_empty() {
        return Ok(LoginTemplate::failed(
            username,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Enter your username and password.",
        ));
    }

    let login = match state.api().login(&username, &form.password).await {
        Ok(login) => login,
        Err(AdminApiError::Unauthorized) => {
            tracing::warn!(username = %username, "Admin login failed");
            return Ok(LoginTemplate::failed(
                username,
                StatusCode::UNAUTHORIZED,
                "Invalid username or password.",
            ));
        }
        Err(e) => {
            tracing::error!(error = %e, "Login request to backend failed");
            return Ok(LoginTemplate::failed(
                username,
                StatusCode::SERVICE_UNAVAILABLE,
                "Login is unavailable right now, please try again shortly.",
            ));
        }
    };

    let admin = CurrentAdmin {
        username: login.user.username,
        full_name: login.user.full_name.unwrap_or_default(),
        role: login.user.role,
        token: login.token,
    };

    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.username);
    set_flash(
        &session,
        Flash::success(format!("Welcome back, {}.", admin.display_name())),
    )
    .await?;

    tracing::info!(admin = %admin.username, role = %admin.role, "Admin logged in");
    Ok(Redirect::to("/").into_response())
}

/// End the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    tracing::info!("Admin logged out");
    Ok(Redirect::to("/auth/login"))
}
