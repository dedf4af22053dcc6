//! Payload types of the Roomily REST API.
//!
//! These types mirror the JSON the backend sends (camelCase keys) and are
//! shared by the storefront and the admin dashboard. Write payloads that only
//! the admin sends live in the admin crate.

pub mod catalog;
pub mod dashboard;
pub mod order;

pub use catalog::{Banner, Category, CategoryRef, Coupon, Product};
pub use dashboard::{DashboardStats, MonthlyRevenue, StatusCount};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, PaymentInstructions, PaymentStatusResponse,
};

use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
///
/// The backend numbers pages from zero; [`Page::current`] converts to the
/// one-based numbering used in URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    #[serde(alias = "page", default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// An empty first page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            content: Vec::new(),
            number: 0,
            size: 0,
            total_elements: 0,
            total_pages: 0,
        }
    }

    /// One-based current page.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.number + 1
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 0
    }
}

/// Error body returned by the backend on 4xx/5xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl ErrorBody {
    /// The most specific message available.
    #[must_use]
    pub fn into_message(self) -> Option<String> {
        let present = |m: &String| !m.trim().is_empty();
        self.message
            .filter(present)
            .or_else(|| self.error.filter(present))
    }
}
