//! Aggregate statistics for the admin dashboard.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OrderStatus;

/// Numbers behind the dashboard stat cards and charts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_revenue: Decimal,
    #[serde(default)]
    pub total_orders: u64,
    #[serde(default)]
    pub total_products: u64,
    #[serde(default)]
    pub total_customers: u64,
    #[serde(default)]
    pub orders_by_status: Vec<StatusCount>,
    #[serde(default)]
    pub revenue_by_month: Vec<MonthlyRevenue>,
}

impl DashboardStats {
    /// Average order value, zero when there are no orders.
    #[must_use]
    pub fn average_order_value(&self) -> Decimal {
        if self.total_orders == 0 {
            return Decimal::ZERO;
        }
        self.total_revenue / Decimal::from(self.total_orders)
    }

    /// Count for a status, zero when the backend omitted it.
    #[must_use]
    pub fn count_for(&self, status: OrderStatus) -> u64 {
        self.orders_by_status
            .iter()
            .find(|entry| entry.status == status)
            .map_or(0, |entry| entry.count)
    }
}

/// Orders per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

/// Revenue and order count for one month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: Decimal,
    #[serde(default)]
    pub orders: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_parse_and_derive() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{
                "totalRevenue": 9000000,
                "totalOrders": 12,
                "totalProducts": 80,
                "ordersByStatus": [{"status": "DELIVERED", "count": 9}],
                "revenueByMonth": [{"month": "2026-04", "revenue": 4000000, "orders": 5}]
            }"#,
        )
        .unwrap();

        assert_eq!(stats.average_order_value(), Decimal::new(750000, 0));
        assert_eq!(stats.count_for(OrderStatus::Delivered), 9);
        assert_eq!(stats.count_for(OrderStatus::Refunded), 0);
        assert_eq!(stats.total_customers, 0);
    }

    #[test]
    fn test_average_with_no_orders() {
        assert_eq!(DashboardStats::default().average_order_value(), Decimal::ZERO);
    }
}
