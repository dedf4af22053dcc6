//! Catalog payloads: products, categories, banners and coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::DiscountPercent;
use crate::types::{BannerId, CategoryId, CouponId, CouponState, CouponWindow, ProductId};

// =============================================================================
// Product
// =============================================================================

/// A catalog item.
///
/// Many items are one-offs, so `stock` is often 1 and `size` a single label
/// rather than a variant list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    /// Price before markdown, shown struck through when higher than `price`.
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    /// Known flaws (stains, loose threads) disclosed to the buyer.
    #[serde(default)]
    pub fault_note: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First image, used as the thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether at least one unit can be bought.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.active && self.stock > 0
    }

    /// The markdown price, if the item is on sale.
    #[must_use]
    pub fn compare_at(&self) -> Option<Decimal> {
        self.original_price.filter(|original| *original > self.price)
    }
}

/// Category reference embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

// =============================================================================
// Category
// =============================================================================

/// A product category (menu entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_count: Option<u32>,
}

// =============================================================================
// Banner
// =============================================================================

/// A hero banner slide on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

// =============================================================================
// Coupon
// =============================================================================

/// A percentage-discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub discount_percent: DiscountPercent,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
}

impl Coupon {
    /// Validity window and usage counter.
    #[must_use]
    pub const fn window(&self) -> CouponWindow {
        CouponWindow {
            starts_at: self.start_date,
            ends_at: self.end_date,
            usage_limit: self.usage_limit,
            used_count: self.used_count,
        }
    }

    /// State at `now`.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> CouponState {
        self.window().state_at(now)
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_parses_minimal_payload() {
        let product: Product =
            serde_json::from_str(r#"{"id":3,"name":"Linen shirt","price":250000}"#).unwrap();

        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.price, Decimal::new(250000, 0));
        assert!(product.active);
        assert!(!product.in_stock());
        assert_eq!(product.thumbnail(), None);
    }

    #[test]
    fn test_product_parses_full_payload() {
        let product: Product = serde_json::from_str(
            r#"{
                "id": 9,
                "name": "Denim jacket",
                "description": "90s wash",
                "price": 420000,
                "originalPrice": 600000,
                "stock": 1,
                "images": ["https://cdn.roomily.tech/a.jpg", "https://cdn.roomily.tech/b.jpg"],
                "category": {"id": 2, "name": "Jackets"},
                "material": "Cotton",
                "size": "M",
                "faultNote": "Small stain on left cuff",
                "active": true,
                "createdAt": "2026-03-01T10:00:00Z"
            }"#,
        )
        .unwrap();

        assert!(product.in_stock());
        assert_eq!(product.compare_at(), Some(Decimal::new(600000, 0)));
        assert_eq!(product.thumbnail(), Some("https://cdn.roomily.tech/a.jpg"));
        assert_eq!(product.category.unwrap().name, "Jackets");
        assert_eq!(product.fault_note.as_deref(), Some("Small stain on left cuff"));
    }

    #[test]
    fn test_compare_at_ignores_lower_original() {
        let product: Product = serde_json::from_str(
            r#"{"id":1,"name":"Tee","price":100000,"originalPrice":90000}"#,
        )
        .unwrap();
        assert_eq!(product.compare_at(), None);
    }

    #[test]
    fn test_coupon_rejects_invalid_percent() {
        let result = serde_json::from_str::<Coupon>(r#"{"id":1,"code":"X","discountPercent":0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_coupon_window() {
        let coupon: Coupon = serde_json::from_str(
            r#"{"id":1,"code":"SUMMER10","discountPercent":10,"usageLimit":5,"usedCount":5}"#,
        )
        .unwrap();
        assert_eq!(coupon.state_at(Utc::now()), CouponState::Exhausted);
    }
}
