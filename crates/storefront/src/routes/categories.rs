//! Category route handlers.

use axum::extract::{Path, Query, State};
use roomily_core::CategoryId;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::products::{ListingQuery, ProductsIndexTemplate, render_listing};
use crate::state::AppState;

/// Display the products of one category.
#[instrument(skip(state), fields(category_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Query(listing): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate> {
    let category = state
        .api()
        .list_categories()
        .await?
        .into_iter()
        .find(|category| category.id == id)
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    let listing = ListingQuery {
        category: None,
        ..listing
    };
    let base_path = format!("/categories/{id}");
    render_listing(&state, &listing, Some(id), category.name, &base_path).await
}
