//! Homepage banner route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use roomily_core::BannerId;
use roomily_core::model::Banner;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::AdminApiError;
use crate::error::Result;
use crate::filters;
use crate::forms::{BannerForm, FieldErrors};
use crate::middleware::{RequireAdminAuth, RequireFullAdmin};
use crate::routes::{Layout, delete_response, saved};
use crate::state::AppState;

/// Banner table template, ordered by position.
#[derive(Template, WebTemplate)]
#[template(path = "banners/index.html")]
pub struct BannersIndexTemplate {
    pub layout: Layout,
    pub banners: Vec<Banner>,
}

#[derive(Template, WebTemplate)]
#[template(path = "banners/form.html")]
pub struct BannerFormTemplate {
    pub layout: Layout,
    pub form: BannerForm,
    pub action: String,
    pub is_edit: bool,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl BannerFormTemplate {
    fn new(layout: Layout, form: BannerForm, action: String) -> Self {
        Self {
            layout,
            is_edit: action != "/banners",
            form,
            action,
            errors: FieldErrors::default(),
            error: None,
        }
    }

    fn rejected(mut self, errors: FieldErrors, error: Option<String>) -> Response {
        self.errors = errors;
        self.error = error;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

#[instrument(skip(state, admin, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> Result<BannersIndexTemplate> {
    let banners = state.api().list_banners(&admin.token).await?;
    Ok(BannersIndexTemplate {
        layout: Layout::new(&admin, "banners", &session).await,
        banners,
    })
}

#[instrument(skip(admin, session))]
pub async fn new_banner(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> BannerFormTemplate {
    BannerFormTemplate::new(
        Layout::new(&admin, "banners", &session).await,
        BannerForm::blank(),
        "/banners".to_string(),
    )
}

#[instrument(skip(state, admin, session, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    let layout = Layout::new(&admin, "banners", &session).await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                BannerFormTemplate::new(layout, form, "/banners".to_string()).rejected(errors, None),
            );
        }
    };

    match state.api().create_banner(&admin.token, &input).await {
        Ok(banner) => {
            tracing::info!(banner_id = %banner.id, "Banner created");
            saved(
                &session,
                format!("Banner \"{}\" created.", banner.title),
                "/banners",
            )
            .await
        }
        Err(AdminApiError::Rejected(message)) => {
            Ok(BannerFormTemplate::new(layout, form, "/banners".to_string())
                .rejected(FieldErrors::default(), Some(message)))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, admin, session))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<BannerId>,
) -> Result<BannerFormTemplate> {
    let banner = state.api().get_banner(&admin.token, id).await?;
    Ok(BannerFormTemplate::new(
        Layout::new(&admin, "banners", &session).await,
        BannerForm::from(&banner),
        format!("/banners/{id}"),
    ))
}

#[instrument(skip(state, admin, session, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<BannerId>,
    Form(form): Form<BannerForm>,
) -> Result<Response> {
    let layout = Layout::new(&admin, "banners", &session).await;
    let action = format!("/banners/{id}");
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(BannerFormTemplate::new(layout, form, action).rejected(errors, None));
        }
    };

    match state.api().update_banner(&admin.token, id, &input).await {
        Ok(banner) => {
            tracing::info!(banner_id = %id, "Banner updated");
            saved(
                &session,
                format!("Banner \"{}\" saved.", banner.title),
                "/banners",
            )
            .await
        }
        Err(AdminApiError::Rejected(message)) => Ok(BannerFormTemplate::new(layout, form, action)
            .rejected(FieldErrors::default(), Some(message))),
        Err(e) => Err(e.into()),
    }
}

/// Delete a banner (ADMIN role only).
#[instrument(skip(state, admin, session, headers))]
pub async fn delete(
    State(state): State<AppState>,
    RequireFullAdmin(admin): RequireFullAdmin,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<BannerId>,
) -> Result<Response> {
    let result = state.api().delete_banner(&admin.token, id).await;
    delete_response(&headers, &session, result, &format!("Banner #{id}"), "/banners").await
}
