//! Product management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use roomily_core::ProductId;
use roomily_core::model::{Category, Product};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{AdminApiError, ProductQuery};
use crate::error::Result;
use crate::filters;
use crate::forms::{FieldErrors, ProductForm};
use crate::middleware::{RequireAdminAuth, RequireFullAdmin};
use crate::models::CurrentAdmin;
use crate::routes::{Layout, Pager, SelectOption, delete_response, filter_url, saved};
use crate::state::AppState;

/// Product table filters from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub page: Option<u32>,
    pub q: Option<String>,
    pub category: Option<String>,
}

/// Product table template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
    pub category_options: Vec<SelectOption>,
    pub pagination: Pager,
    pub search: String,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub form: ProductForm,
    pub category_options: Vec<SelectOption>,
    /// Where the form posts.
    pub action: String,
    pub is_edit: bool,
    pub errors: FieldErrors,
    /// Refusal from the backend.
    pub error: Option<String>,
}

impl ProductFormTemplate {
    async fn new(
        state: &AppState,
        admin: &CurrentAdmin,
        session: &Session,
        form: ProductForm,
        action: String,
    ) -> Result<Self> {
        let categories = state.api().list_categories(&admin.token).await?;
        Ok(Self {
            layout: Layout::new(admin, "products", session).await,
            is_edit: action != "/products",
            category_options: category_options(&categories, &form.category_id),
            form,
            action,
            errors: FieldErrors::default(),
            error: None,
        })
    }

    fn rejected(mut self, errors: FieldErrors, error: Option<String>) -> Response {
        self.errors = errors;
        self.error = error;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

fn category_options(categories: &[Category], current: &str) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|category| SelectOption::new(category.id.to_string(), category.name.clone(), current))
        .collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// Paginated product table.
#[instrument(skip(state, admin, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Query(query): Query<ProductsQuery>,
) -> Result<ProductsIndexTemplate> {
    let search = query.q.unwrap_or_default();
    let selected_category = query.category.unwrap_or_default();

    let api_query = ProductQuery {
        page: query.page.unwrap_or(1).max(1),
        size: state.config().page_size,
        category_id: selected_category.parse().ok(),
        search: Some(search.clone()),
    };
    let page = state.api().list_products(&admin.token, &api_query).await?;
    let categories = state.api().list_categories(&admin.token).await?;

    let base = filter_url(
        "/products",
        &[
            ("q", Some(search.clone())),
            ("category", Some(selected_category.clone())),
        ],
    );

    Ok(ProductsIndexTemplate {
        layout: Layout::new(&admin, "products", &session).await,
        pagination: Pager::new(&page, &base),
        products: page.content,
        category_options: category_options(&categories, &selected_category),
        search,
    })
}

/// Blank create form.
#[instrument(skip(state, admin, session))]
pub async fn new_product(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> Result<ProductFormTemplate> {
    ProductFormTemplate::new(
        &state,
        &admin,
        &session,
        ProductForm::blank(),
        "/products".to_string(),
    )
    .await
}

/// Create a product.
#[instrument(skip(state, admin, session, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                ProductFormTemplate::new(&state, &admin, &session, form, "/products".to_string())
                    .await?
                    .rejected(errors, None),
            );
        }
    };

    match state.api().create_product(&admin.token, &input).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            saved(
                &session,
                format!("Product \"{}\" created.", product.name),
                "/products",
            )
            .await
        }
        Err(AdminApiError::Rejected(message)) => Ok(ProductFormTemplate::new(
            &state,
            &admin,
            &session,
            form,
            "/products".to_string(),
        )
        .await?
        .rejected(FieldErrors::default(), Some(message))),
        Err(e) => Err(e.into()),
    }
}

/// Edit form filled from the backend.
#[instrument(skip(state, admin, session))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate> {
    let product = state.api().get_product(&admin.token, id).await?;
    ProductFormTemplate::new(
        &state,
        &admin,
        &session,
        ProductForm::from(&product),
        format!("/products/{id}"),
    )
    .await
}

/// Update a product.
#[instrument(skip(state, admin, session, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let action = format!("/products/{id}");
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(ProductFormTemplate::new(&state, &admin, &session, form, action)
                .await?
                .rejected(errors, None));
        }
    };

    match state.api().update_product(&admin.token, id, &input).await {
        Ok(product) => {
            tracing::info!(product_id = %id, "Product updated");
            saved(
                &session,
                format!("Product \"{}\" saved.", product.name),
                "/products",
            )
            .await
        }
        Err(AdminApiError::Rejected(message)) => {
            Ok(ProductFormTemplate::new(&state, &admin, &session, form, action)
                .await?
                .rejected(FieldErrors::default(), Some(message)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a product (ADMIN role only).
#[instrument(skip(state, admin, session, headers))]
pub async fn delete(
    State(state): State<AppState>,
    RequireFullAdmin(admin): RequireFullAdmin,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let result = state.api().delete_product(&admin.token, id).await;
    delete_response(&headers, &session, result, &format!("Product #{id}"), "/products").await
}
