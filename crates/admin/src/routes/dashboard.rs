//! Dashboard route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Json, extract::State};
use roomily_core::model::DashboardStats;
use roomily_core::OrderStatus;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::Layout;
use crate::state::AppState;

/// One bar of a chart, scaled against the largest value in its series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    pub label: String,
    pub value: Decimal,
    /// 0-100, relative to the series maximum.
    pub percent: u32,
}

/// Both dashboard series.
#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub revenue_by_month: Vec<ChartBar>,
    pub orders_by_status: Vec<ChartBar>,
}

impl ChartData {
    #[must_use]
    pub fn from_stats(stats: &DashboardStats) -> Self {
        let revenue_by_month = scale(
            stats
                .revenue_by_month
                .iter()
                .map(|month| (month.month.clone(), month.revenue))
                .collect(),
        );
        // Every status gets a bar, even with no orders
        let orders_by_status = scale(
            OrderStatus::ALL
                .iter()
                .map(|&status| (status.label().to_string(), Decimal::from(stats.count_for(status))))
                .collect(),
        );
        Self {
            revenue_by_month,
            orders_by_status,
        }
    }
}

fn scale(series: Vec<(String, Decimal)>) -> Vec<ChartBar> {
    let max = series
        .iter()
        .map(|(_, value)| *value)
        .max()
        .unwrap_or(Decimal::ZERO);

    series
        .into_iter()
        .map(|(label, value)| {
            let percent = if max > Decimal::ZERO && value > Decimal::ZERO {
                (value * Decimal::ONE_HUNDRED / max)
                    .round()
                    .to_u32()
                    .unwrap_or(0)
                    .clamp(1, 100)
            } else {
                0
            };
            ChartBar {
                label,
                value,
                percent,
            }
        })
        .collect()
}

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub stats: DashboardStats,
    pub average_order_value: Decimal,
    pub pending_orders: u64,
    pub charts: ChartData,
}

/// Stat cards and charts.
#[instrument(skip(state, admin, session))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> Result<DashboardTemplate> {
    let stats = state.api().stats(&admin.token).await?;

    Ok(DashboardTemplate {
        layout: Layout::new(&admin, "dashboard", &session).await,
        average_order_value: stats.average_order_value(),
        pending_orders: stats.count_for(OrderStatus::Pending),
        charts: ChartData::from_stats(&stats),
        stats,
    })
}

/// Chart series as JSON.
#[instrument(skip(state, admin))]
pub async fn chart(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<Json<ChartData>> {
    let stats = state.api().stats(&admin.token).await?;
    Ok(Json(ChartData::from_stats(&stats)))
}
