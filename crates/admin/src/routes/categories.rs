//! Category management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use roomily_core::CategoryId;
use roomily_core::model::Category;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::AdminApiError;
use crate::error::Result;
use crate::filters;
use crate::forms::{CategoryForm, FieldErrors};
use crate::middleware::{RequireAdminAuth, RequireFullAdmin};
use crate::routes::{Layout, delete_response, saved};
use crate::state::AppState;

/// Category table template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub layout: Layout,
    pub form: CategoryForm,
    pub action: String,
    pub is_edit: bool,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl CategoryFormTemplate {
    fn new(layout: Layout, form: CategoryForm, action: String) -> Self {
        Self {
            layout,
            is_edit: action != "/categories",
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

/// Every category with its product count.
#[instrument(skip(state, admin, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> Result<CategoriesIndexTemplate> {
    let categories = state.api().list_categories(&admin.token).await?;
    Ok(CategoriesIndexTemplate {
        layout: Layout::new(&admin, "categories", &session).await,
        categories,
    })
}

#[instrument(skip(admin, session))]
pub async fn new_category(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> CategoryFormTemplate {
    CategoryFormTemplate::new(
        Layout::new(&admin, "categories", &session).await,
        CategoryForm::default(),
        "/categories".to_string(),
    )
}

#[instrument(skip(state, admin, session, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let layout = Layout::new(&admin, "categories", &session).await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(CategoryFormTemplate::new(layout, form, "/categories".to_string())
                .rejected(errors, None));
        }
    };

    match state.api().create_category(&admin.token, &input).await {
        Ok(category) => {
            tracing::info!(category_id = %category.id, "Category created");
            saved(
                &session,
                format!("Category \"{}\" created.", category.name),
                "/categories",
            )
            .await
        }
        Err(AdminApiError::Rejected(message)) => {
            Ok(CategoryFormTemplate::new(layout, form, "/categories".to_string())
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
    Path(id): Path<CategoryId>,
) -> Result<CategoryFormTemplate> {
    let category = state.api().get_category(&admin.token, id).await?;
    Ok(CategoryFormTemplate::new(
        Layout::new(&admin, "categories", &session).await,
        CategoryForm::from(&category),
        format!("/categories/{id}"),
    ))
}

#[instrument(skip(state, admin, session, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let layout = Layout::new(&admin, "categories", &session).await;
    let action = format!("/categories/{id}");
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(CategoryFormTemplate::new(layout, form, action).rejected(errors, None));
        }
    };

    match state.api().update_category(&admin.token, id, &input).await {
        Ok(category) => {
            tracing::info!(category_id = %id, "Category updated");
            saved(
                &session,
                format!("Category \"{}\" saved.", category.name),
                "/categories",
            )
            .await
        }
        Err(AdminApiError::Rejected(message)) => Ok(CategoryFormTemplate::new(layout, form, action)
            .rejected(FieldErrors::default(), Some(message))),
        Err(e) => Err(e.into()),
    }
}

/// Delete a category (ADMIN role only). The backend refuses while products use it.
#[instrument(skip(state, admin, session, headers))]
pub async fn delete(
    State(state): State<AppState>,
    RequireFullAdmin(admin): RequireFullAdmin,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let result = state.api().delete_category(&admin.token, id).await;
    delete_response(
        &headers,
        &session,
        result,
        &format!("Category #{id}"),
        "/categories",
    )
    .await
}
