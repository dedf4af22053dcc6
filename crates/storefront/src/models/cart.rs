//! Session-stored shopping cart.
//!
//! Lines snapshot the product's name, price and stock at the time they were
//! added. The backend re-prices everything when the order is placed, so the
//! snapshot only drives what the shopper sees.

use roomily_core::model::{NewOrderItem, Product};
use roomily_core::{CartTotals, CurrencyCode, DiscountPercent, PricedLine, ProductId, ShippingPolicy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use super::session_keys;

/// Cart mutation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("{0} is sold out")]
    OutOfStock(String),
    #[error("only {available} of {name} available")]
    StockLimit { name: String, available: u32 },
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub size: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Stock when the line was last touched.
    pub max_quantity: u32,
}

impl CartLine {
    /// Snapshot a product with the requested quantity.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            image: product.thumbnail().map(String::from),
            size: product.size.clone(),
            unit_price: product.price,
            quantity,
            max_quantity: if product.active { product.stock } else { 0 },
        }
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A coupon the backend accepted for this cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub percent: DiscountPercent,
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCart {
    pub lines: Vec<CartLine>,
    pub coupon: Option<AppliedCoupon>,
}

impl SessionCart {
    /// Load the cart from the session; a missing or unreadable cart is empty.
    pub async fn load(session: &Session) -> Self {
        match session.get::<Self>(session_keys::CART).await {
            Ok(cart) => cart.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read cart from session: {e}");
                Self::default()
            }
        }
    }

    /// Persist the cart to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::CART, self).await
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// The merged quantity is capped at the latest known stock. Returns the
    /// quantity now in the cart for that product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when nothing can be added and
    /// [`CartError::StockLimit`] when the cart already holds all available units.
    pub fn add(&mut self, line: CartLine) -> Result<u32, CartError> {
        if line.max_quantity == 0 {
            return Err(CartError::OutOfStock(line.name));
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            if existing.quantity >= line.max_quantity {
                return Err(CartError::StockLimit {
                    name: line.name,
                    available: line.max_quantity,
                });
            }
            existing.quantity = existing
                .quantity
                .saturating_add(line.quantity.max(1))
                .min(line.max_quantity);
            existing.max_quantity = line.max_quantity;
            existing.unit_price = line.unit_price;
            return Ok(existing.quantity);
        }

        let quantity = line.quantity.clamp(1, line.max_quantity);
        self.lines.push(CartLine { quantity, ..line });
        Ok(quantity)
    }

    /// Change a line's quantity; `0` removes it. Returns `false` for unknown lines.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.lines.iter_mut().find(|line| line.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity.min(line.max_quantity.max(1));
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` for unknown lines.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        if self.lines.is_empty() {
            self.coupon = None;
        }
        self.lines.len() != before
    }

    /// Empty the cart and drop the coupon.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupon = None;
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line totals before discount and shipping.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Totals including the applied coupon and shipping.
    #[must_use]
    pub fn totals(&self, policy: &ShippingPolicy, currency: CurrencyCode) -> CartTotals {
        let lines: Vec<PricedLine> = self
            .lines
            .iter()
            .map(|line| PricedLine {
                unit_price: line.unit_price,
                quantity: line.quantity,
            })
            .collect();
        CartTotals::compute(
            &lines,
            self.coupon.as_ref().map(|coupon| coupon.percent),
            policy,
            currency,
        )
    }

    /// Lines as sent to the order endpoint.
    #[must_use]
    pub fn order_items(&self) -> Vec<NewOrderItem> {
        self.lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {

    use super::*;

    fn line(id: i64, price: Decimal, quantity: u32, stock: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("Item {id}"),
            image: None,
            size: Some("M".to_string()),
            unit_price: price,
            quantity,
            max_quantity: stock,
        }
    }

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            flat_fee: Decimal::new(30000, 0),
            free_threshold: Some(Decimal::new(500000, 0)),
        }
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = SessionCart::default();
        assert_eq!(cart.add(line(1, Decimal::new(100000, 0), 1, 5)).unwrap(), 1);
        assert_eq!(cart.add(line(1, Decimal::new(100000, 0), 2, 5)).unwrap(), 3);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_caps_at_stock() {
        let mut cart = SessionCart::default();
        assert_eq!(cart.add(line(1, Decimal::new(100000, 0), 4, 2)).unwrap(), 2);
        assert_eq!(
            cart.add(line(1, Decimal::new(100000, 0), 1, 2)),
            Err(CartError::StockLimit {
                name: "Item 1".to_string(),
                available: 2
            })
        );
    }

    #[test]
    fn test_add_huge_quantity_fills_to_stock() {
        let mut cart = SessionCart::default();
        cart.add(line(1, Decimal::new(100000, 0), 1, 5)).unwrap();
        assert_eq!(cart.add(line(1, Decimal::new(100000, 0), u32::MAX, 5)).unwrap(), 5);
        assert_eq!(cart.item_count(), 5);

        let mut fresh = SessionCart::default();
        assert_eq!(fresh.add(line(2, Decimal::new(100000, 0), u32::MAX, 3)).unwrap(), 3);
    }

    #[test]
    fn test_add_sold_out() {
        let mut cart = SessionCart::default();
        let result = cart.add(line(1, Decimal::new(100000, 0), 1, 0));
        assert_eq!(result, Err(CartError::OutOfStock("Item 1".to_string())));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = SessionCart::default();
        cart.add(line(1, Decimal::new(100000, 0), 1, 3)).unwrap();

        assert!(cart.set_quantity(ProductId::new(1), 10));
        assert_eq!(cart.item_count(), 3);

        assert!(!cart.set_quantity(ProductId::new(2), 1));

        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_removing_last_line_drops_coupon() {
        let mut cart = SessionCart::default();
        cart.add(line(1, Decimal::new(100000, 0), 1, 1)).unwrap();
        cart.add(line(2, Decimal::new(50000, 0), 1, 1)).unwrap();
        cart.coupon = Some(AppliedCoupon {
            code: "SALE10".to_string(),
            percent: DiscountPercent::new(Decimal::new(10, 0)).unwrap(),
        });

        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.coupon.is_some());
        assert!(cart.remove(ProductId::new(2)));
        assert!(cart.coupon.is_none());
        assert!(!cart.remove(ProductId::new(2)));
    }

    #[test]
    fn test_totals_with_coupon_and_shipping() {
        let mut cart = SessionCart::default();
        cart.add(line(1, Decimal::new(250000, 0), 1, 1)).unwrap();
        cart.add(line(2, Decimal::new(120000, 0), 1, 1)).unwrap();
        cart.coupon = Some(AppliedCoupon {
            code: "SALE15".to_string(),
            percent: DiscountPercent::new(Decimal::new(15, 0)).unwrap(),
        });

        let totals = cart.totals(&policy(), CurrencyCode::VND);
        assert_eq!(totals.subtotal, Decimal::new(370000, 0));
        assert_eq!(totals.discount, Decimal::new(55500, 0));
        assert_eq!(totals.shipping, Decimal::new(30000, 0));
        assert_eq!(totals.total, Decimal::new(344500, 0));
        assert_eq!(totals.remaining_for_free_shipping, Some(Decimal::new(130000, 0)));
    }

    #[test]
    fn test_order_items() {
        let mut cart = SessionCart::default();
        cart.add(line(7, Decimal::new(90000, 0), 2, 5)).unwrap();
        let items = cart.order_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(7));
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn test_line_from_product() {
        let product: Product = serde_json::from_str(
            r#"{"id":5,"name":"Silk scarf","price":180000,"stock":1,"size":"One size",
                "images":["https://cdn.roomily.tech/s.jpg"],"active":false}"#,
        )
        .unwrap();

        let line = CartLine::from_product(&product, 1);
        assert_eq!(line.image.as_deref(), Some("https://cdn.roomily.tech/s.jpg"));
        assert_eq!(line.max_quantity, 0);
    }
}
