//! Coupon validity window.
//!
//! The backend decides whether a code can be redeemed. This type lets the
//! admin list and the storefront show the same verdict without a round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived coupon state at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponState {
    /// Validity window has not opened yet.
    Scheduled,
    /// Redeemable.
    Active,
    /// Validity window has closed.
    Expired,
    /// Usage limit reached.
    Exhausted,
}

impl CouponState {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Active => "Active",
            Self::Expired => "Expired",
            Self::Exhausted => "Used up",
        }
    }

    /// CSS classes for the state badge.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Scheduled => "bg-blue-100 text-blue-700",
            Self::Active => "bg-green-100 text-green-700",
            Self::Expired => "bg-gray-100 text-gray-700",
            Self::Exhausted => "bg-orange-100 text-orange-700",
        }
    }
}

/// Validity window and usage counter of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CouponWindow {
    /// First instant the code is valid, if bounded.
    pub starts_at: Option<DateTime<Utc>>,
    /// Last instant the code is valid, if bounded.
    pub ends_at: Option<DateTime<Utc>>,
    /// Maximum redemptions, if bounded.
    pub usage_limit: Option<u32>,
    /// Redemptions so far.
    pub used_count: u32,
}

impl CouponWindow {
    /// State of the coupon at `now`.
    ///
    /// Exhaustion wins over the time window: a used-up code is reported as
    /// such even before it expires.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> CouponState {
        if self.usage_limit.is_some_and(|limit| self.used_count >= limit) {
            return CouponState::Exhausted;
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return CouponState::Scheduled;
        }
        if self.ends_at.is_some_and(|end| now > end) {
            return CouponState::Expired;
        }
        CouponState::Active
    }

    /// Remaining redemptions, if the coupon is limited.
    #[must_use]
    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit
            .map(|limit| limit.saturating_sub(self.used_count))
    }

    /// Whether the window bounds are ordered (start before end).
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        match (self.starts_at, self.ends_at) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        }
    }
}
