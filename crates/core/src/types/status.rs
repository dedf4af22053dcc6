//! Status enums for orders and payments.
//!
//! The Roomily backend is the only authority on status transitions. The
//! helpers here exist so the front ends can label statuses and offer sensible
//! choices; a transition the backend refuses is reported back as an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Delivered,
    Cancelled,
    Refunded,
    Duplicate,
}

impl OrderStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
        Self::Duplicate,
    ];

    /// Wire representation (`PENDING`, `CONFIRMED`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
            Self::Duplicate => "DUPLICATE",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Processing => "Processing",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Duplicate => "Duplicate",
        }
    }

    /// CSS classes for the status badge.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending => "bg-yellow-100 text-yellow-700",
            Self::Confirmed => "bg-blue-100 text-blue-700",
            Self::Processing => "bg-indigo-100 text-indigo-700",
            Self::Delivered => "bg-green-100 text-green-700",
            Self::Cancelled => "bg-red-100 text-red-700",
            Self::Refunded => "bg-purple-100 text-purple-700",
            Self::Duplicate => "bg-gray-100 text-gray-700",
        }
    }

    /// Whether no further change is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Delivered | Self::Cancelled | Self::Refunded | Self::Duplicate
        )
    }

    /// Statuses offered in the admin status picker.
    ///
    /// Delivered orders may still be refunded; other terminal statuses offer
    /// nothing.
    #[must_use]
    pub fn next_choices(self) -> Vec<Self> {
        match self {
            Self::Pending => vec![Self::Confirmed, Self::Cancelled, Self::Duplicate],
            Self::Confirmed => vec![Self::Processing, Self::Cancelled],
            Self::Processing => vec![Self::Delivered, Self::Cancelled],
            Self::Delivered => vec![Self::Refunded],
            Self::Cancelled | Self::Refunded | Self::Duplicate => Vec::new(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment status for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Expired,
    Cancelled,
}

impl PaymentStatus {
    /// Whether polling can stop.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting payment",
            Self::Paid => "Paid",
            Self::Failed => "Payment failed",
            Self::Expired => "Payment expired",
            Self::Cancelled => "Payment cancelled",
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Bank transfer, confirmed asynchronously by the backend.
    BankTransfer,
}

impl PaymentMethod {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cod => "Cash on delivery",
            Self::BankTransfer => "Bank transfer",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COD" => Ok(Self::Cod),
            "BANK_TRANSFER" => Ok(Self::BankTransfer),
            other => Err(format!("invalid payment method: {other}")),
        }
    }
}

/// Admin role as reported by the backend login endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    /// Full access.
    Admin,
    /// Can manage catalog and orders.
    #[default]
    Staff,
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Staff => write!(f, "STAFF"),
        }
    }
}
