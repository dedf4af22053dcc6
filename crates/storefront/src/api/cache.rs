//! Cache types for catalog reads.

use roomily_core::ProductId;
use roomily_core::model::{Banner, Category, Page, Product};

use super::ProductQuery;

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
    Categories,
    Banners,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Page<Product>),
    Categories(Vec<Category>),
    Banners(Vec<Banner>),
}
