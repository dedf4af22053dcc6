//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use roomily_core::model::{Banner, Category};
use tracing::instrument;

use crate::api::ProductQuery;
use crate::filters;
use crate::routes::products::ProductCard;
use crate::state::AppState;

/// New arrivals shown on the home page.
const NEW_ARRIVALS: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub banners: Vec<Banner>,
    pub new_arrivals: Vec<ProductCard>,
    pub categories: Vec<Category>,
}

/// Display the home page.
///
/// Each section degrades to empty on backend errors so one failing endpoint
/// does not take the home page down.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> HomeTemplate {
    let arrivals_query = ProductQuery {
        size: NEW_ARRIVALS,
        ..ProductQuery::default()
    };

    let (banners, products, categories) = tokio::join!(
        state.api().list_active_banners(),
        state.api().list_products(&arrivals_query),
        state.api().list_categories(),
    );

    let banners = banners.unwrap_or_else(|e| {
        tracing::warn!("Failed to load banners: {e}");
        Vec::new()
    });
    let new_arrivals = products.map_or_else(
        |e| {
            tracing::warn!("Failed to load new arrivals: {e}");
            Vec::new()
        },
        |page| page.content.iter().map(ProductCard::from).collect(),
    );
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!("Failed to load categories: {e}");
        Vec::new()
    });

    HomeTemplate {
        banners,
        new_arrivals,
        categories,
    }
}
