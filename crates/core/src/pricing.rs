//! Cart pricing: subtotal, coupon discount, shipping fee and grand total.
//!
//! These are the numbers the shopper sees before placing an order. The
//! backend recomputes the charged amount when the order is created, so this
//! module only has to agree with it, not replace it.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CurrencyCode;

/// Errors raised by pricing inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// A discount percentage outside `(0, 100]`.
    #[error("discount percent must be greater than 0 and at most 100 (got {0})")]
    PercentOutOfRange(Decimal),
}

/// A coupon discount percentage in `(0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DiscountPercent(Decimal);

impl DiscountPercent {
    /// Validate a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::PercentOutOfRange`] for zero, negative or
    /// values above 100.
    pub fn new(percent: Decimal) -> Result<Self, PricingError> {
        if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(PricingError::PercentOutOfRange(percent));
        }
        Ok(Self(percent))
    }

    /// The raw percentage.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for DiscountPercent {
    type Error = PricingError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercent> for Decimal {
    fn from(percent: DiscountPercent) -> Self {
        percent.0
    }
}

/// One cart line reduced to what pricing needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Flat-rate shipping with an optional free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Fee charged below the threshold.
    pub flat_fee: Decimal,
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Option<Decimal>,
}

impl ShippingPolicy {
    /// Shipping fee for a cart subtotal (before discount).
    ///
    /// An empty cart ships nothing and costs nothing.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match self.free_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.flat_fee,
        }
    }

    /// How much more the shopper must add to qualify for free shipping.
    ///
    /// `None` when there is no threshold, the cart is empty or it already
    /// qualifies.
    #[must_use]
    pub fn remaining_for_free(&self, subtotal: Decimal) -> Option<Decimal> {
        let threshold = self.free_threshold?;
        if subtotal <= Decimal::ZERO || subtotal >= threshold {
            return None;
        }
        Some(threshold - subtotal)
    }
}

/// Discount granted by a percentage coupon on a subtotal.
///
/// Rounded down to the currency's smallest unit so the shopper is never
/// promised more than the backend will grant.
#[must_use]
pub fn discount_for(subtotal: Decimal, percent: DiscountPercent, currency: CurrencyCode) -> Decimal {
    if subtotal <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = subtotal * percent.value() / Decimal::ONE_HUNDRED;
    raw.round_dp_with_strategy(currency.minor_digits(), RoundingStrategy::ToZero)
        .min(subtotal)
}

/// Totals shown on the cart and checkout pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub item_count: u32,
    /// Amount still needed for free shipping, if any.
    pub remaining_for_free_shipping: Option<Decimal>,
    pub currency: CurrencyCode,
}

impl CartTotals {
    /// Compute totals for a set of lines.
    ///
    /// `total = subtotal - discount + shipping`, never negative. The free
    /// shipping threshold is checked against the undiscounted subtotal.
    #[must_use]
    pub fn compute(
        lines: &[PricedLine],
        coupon: Option<DiscountPercent>,
        policy: &ShippingPolicy,
        currency: CurrencyCode,
    ) -> Self {
        let subtotal: Decimal = lines.iter().map(PricedLine::line_total).sum();
        let item_count = lines.iter().map(|line| line.quantity).sum();
        let discount = coupon.map_or(Decimal::ZERO, |percent| {
            discount_for(subtotal, percent, currency)
        });
        let shipping = policy.fee_for(subtotal);
        let total = (subtotal - discount + shipping).max(Decimal::ZERO);

        Self {
            subtotal,
            discount,
            shipping,
            total,
            item_count,
            remaining_for_free_shipping: policy.remaining_for_free(subtotal),
            currency,
        }
    }

    /// Whether the cart has nothing to check out.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}
