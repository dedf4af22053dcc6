//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use roomily_core::model::{Page, Product};
use roomily_core::{CategoryId, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::api::{DEFAULT_PAGE_SIZE, ProductQuery, ProductSort};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Related products shown under a product.
const RELATED_LIMIT: usize = 4;

/// Fetch one extra in case the product itself is in the page.
const RELATED_FETCH: u32 = 5;

/// Product card data for grids.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub compare_at: Option<Decimal>,
    pub image: Option<String>,
    pub size: Option<String>,
    pub sold_out: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            compare_at: product.compare_at(),
            image: product.thumbnail().map(String::from),
            size: product.size.clone(),
            sold_out: !product.in_stock(),
        }
    }
}

/// Sort dropdown entry.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub slug: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Previous/next links for a listing.
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub current: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pagination {
    /// Build links for a page, preserving the other query parameters.
    #[must_use]
    pub fn new<T>(page: &Page<T>, base_path: &str, listing: &ListingQuery) -> Self {
        let link = |target: u32| format!("{base_path}?{}", listing.to_query_string(target));
        Self {
            current: page.current(),
            total_pages: page.total_pages.max(1),
            prev_url: page.has_previous().then(|| link(page.current() - 1)),
            next_url: page.has_next().then(|| link(page.current() + 1)),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub category: Option<CategoryId>,
}

impl ListingQuery {
    /// Backend query for this listing.
    #[must_use]
    pub fn to_product_query(&self) -> ProductQuery {
        ProductQuery {
            page: self.page.unwrap_or(1).max(1),
            size: DEFAULT_PAGE_SIZE,
            category_id: self.category,
            search: self.search().map(String::from),
            sort: ProductSort::from_slug(self.sort.as_deref()),
        }
    }

    /// Trimmed search term, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// URL query string for another page of this listing.
    #[must_use]
    pub fn to_query_string(&self, page: u32) -> String {
        let mut parts = vec![format!("page={page}")];
        if let Some(q) = self.search() {
            parts.push(format!("q={}", urlencoding::encode(q)));
        }
        if let Some(sort) = self.sort.as_deref() {
            parts.push(format!("sort={}", urlencoding::encode(sort)));
        }
        if let Some(category) = self.category {
            parts.push(format!("category={category}"));
        }
        parts.join("&")
    }

    fn sort_options(&self) -> Vec<SortOption> {
        let current = ProductSort::from_slug(self.sort.as_deref());
        ProductSort::ALL
            .into_iter()
            .map(|sort| SortOption {
                slug: sort.slug(),
                label: sort.label(),
                selected: sort == current,
            })
            .collect()
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub heading: String,
    pub action: String,
    pub search: String,
    pub products: Vec<ProductCard>,
    pub total_elements: u64,
    pub sort_options: Vec<SortOption>,
    pub pagination: Pagination,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub compare_at: Option<Decimal>,
    pub in_stock: bool,
    pub related_products: Vec<ProductCard>,
}

/// Render a product listing under `base_path`.
///
/// `category` restricts the listing without showing up in page links, for
/// paths that already name the category.
///
/// # Errors
///
/// Returns an error if the backend request fails.
pub async fn render_listing(
    state: &AppState,
    listing: &ListingQuery,
    category: Option<CategoryId>,
    heading: String,
    base_path: &str,
) -> Result<ProductsIndexTemplate> {
    let mut query = listing.to_product_query();
    if category.is_some() {
        query.category_id = category;
    }
    let page = state.api().list_products(&query).await?;

    Ok(ProductsIndexTemplate {
        heading,
        action: base_path.to_string(),
        search: listing.search().unwrap_or_default().to_string(),
        products: page.content.iter().map(ProductCard::from).collect(),
        total_elements: page.total_elements,
        sort_options: listing.sort_options(),
        pagination: Pagination::new(&page, base_path, listing),
    })
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(listing): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate> {
    let heading = listing.search().map_or_else(
        || "All products".to_string(),
        |q| format!("Results for \u{201c}{q}\u{201d}"),
    );
    render_listing(&state, &listing, None, heading, "/products").await
}

/// Display product detail page.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<ProductShowTemplate> {
    let product = state.api().get_product(id).await?;

    let related_products = match &product.category {
        Some(category) => {
            let query = ProductQuery {
                category_id: Some(category.id),
                size: RELATED_FETCH,
                ..ProductQuery::default()
            };
            match state.api().list_products(&query).await {
                Ok(page) => page
                    .content
                    .iter()
                    .filter(|related| related.id != product.id)
                    .take(RELATED_LIMIT)
                    .map(ProductCard::from)
                    .collect(),
                Err(e) => {
                    tracing::warn!("Failed to load related products: {e}");
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    Ok(ProductShowTemplate {
        compare_at: product.compare_at(),
        in_stock: product.in_stock(),
        product,
        related_products,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page(number: u32, total_pages: u32) -> Page<u32> {
        Page {
            content: Vec::new(),
            number,
            size: 12,
            total_elements: u64::from(total_pages) * 12,
            total_pages,
        }
    }

    #[test]
    fn test_query_string_keeps_filters() {
        let listing = ListingQuery {
            page: Some(1),
            q: Some(" áo dài ".to_string()),
            sort: Some("price-asc".to_string()),
            category: Some(CategoryId::new(3)),
        };
        assert_eq!(
            listing.to_query_string(2),
            "page=2&q=%C3%A1o%20d%C3%A0i&sort=price-asc&category=3"
        );
    }

    #[test]
    fn test_pagination_links() {
        let listing = ListingQuery::default();

        let first = Pagination::new(&page(0, 3), "/products", &listing);
        assert_eq!(first.current, 1);
        assert!(first.prev_url.is_none());
        assert_eq!(first.next_url.as_deref(), Some("/products?page=2"));

        let last = Pagination::new(&page(2, 3), "/categories/4", &listing);
        assert_eq!(last.prev_url.as_deref(), Some("/categories/4?page=2"));
        assert!(last.next_url.is_none());
    }

    #[test]
    fn test_listing_defaults() {
        let query = ListingQuery {
            page: Some(0),
            ..ListingQuery::default()
        }
        .to_product_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.sort, ProductSort::Newest);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_card_marks_sold_out() {
        let product: Product =
            serde_json::from_str(r#"{"id":1,"name":"Tee","price":90000,"stock":0}"#).unwrap();
        let card = ProductCard::from(&product);
        assert!(card.sold_out);
        assert!(card.image.is_none());
    }

    #[test]
    fn test_sort_options_mark_selection() {
        let listing = ListingQuery {
            sort: Some("price-desc".to_string()),
            ..ListingQuery::default()
        };
        let selected: Vec<_> = listing
            .sort_options()
            .into_iter()
            .filter(|option| option.selected)
            .map(|option| option.slug)
            .collect();
        assert_eq!(selected, vec!["price-desc"]);
    }
}
