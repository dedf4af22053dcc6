//! Order confirmation and payment polling.
//!
//! Bank transfer orders show a QR code and poll the backend until the
//! transfer is reconciled. Polling stops once the payment settles (the page
//! reloads via `HX-Redirect`) or the configured timeout since the order was
//! placed has passed.

use std::time::Duration;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{AppendHeaders, IntoResponse, Response},
};
use chrono::{DateTime, TimeDelta, Utc};
use roomily_core::model::{Order, PaymentStatusResponse};
use roomily_core::OrderId;
use rust_decimal::Decimal;
use tower_sessions::Session;
use tracing::instrument;

use crate::config::PaymentConfig;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::{PlacedOrder, placed_order};
use crate::state::AppState;

/// What the polling fragment should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Payment or order reached a final state; reload the order page.
    Settled,
    /// Still pending after the timeout; stop polling.
    Expired,
    /// Keep polling.
    Waiting,
}

/// Decide the next polling step.
#[must_use]
pub fn poll_outcome(
    status: &PaymentStatusResponse,
    placed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    timeout: Duration,
) -> PollOutcome {
    if status.payment_status.is_settled() || status.order_status.is_some_and(|s| s.is_terminal())
    {
        return PollOutcome::Settled;
    }
    let timeout = TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX);
    if now.signed_duration_since(placed_at) >= timeout {
        PollOutcome::Expired
    } else {
        PollOutcome::Waiting
    }
}

/// Polling fragment state.
#[derive(Debug, Clone)]
pub struct PaymentPoll {
    pub order_id: OrderId,
    pub interval_secs: u64,
    pub expired: bool,
}

/// Bank transfer details shown next to the QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferView {
    pub qr_url: Option<String>,
    pub bank_code: Option<String>,
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub reference: String,
    pub amount: Decimal,
}

impl TransferView {
    /// Transfer details for an order awaiting a transfer.
    ///
    /// Backend-provided instructions win; the configured account fills the
    /// gaps. The QR code is built from the account when the backend sends
    /// none.
    #[must_use]
    pub fn for_order(order: &Order, config: &PaymentConfig) -> Option<Self> {
        if !order.awaits_transfer() {
            return None;
        }
        let payment = order.payment.clone().unwrap_or_default();

        let bank_code = payment.bank_code.or_else(|| config.bank_code.clone());
        let account_number = payment
            .account_number
            .or_else(|| config.bank_account.clone());
        let account_name = payment
            .account_name
            .or_else(|| config.bank_account_name.clone());
        let reference = payment
            .transfer_content
            .unwrap_or_else(|| order.display_code());

        let qr_url = payment.qr_url.or_else(|| match (&bank_code, &account_number) {
            (Some(bank), Some(account)) => Some(vietqr_url(
                bank,
                account,
                order.total_amount,
                &reference,
                account_name.as_deref(),
            )),
            _ => None,
        });

        Some(Self {
            qr_url,
            bank_code,
            account_number,
            account_name,
            reference,
            amount: order.total_amount,
        })
    }
}

/// Build a `VietQR` image URL for a transfer.
fn vietqr_url(
    bank: &str,
    account: &str,
    amount: Decimal,
    reference: &str,
    account_name: Option<&str>,
) -> String {
    let mut url = format!(
        "https://img.vietqr.io/image/{}-{}-compact2.png?amount={}&addInfo={}",
        urlencoding::encode(bank),
        urlencoding::encode(account),
        amount.trunc(),
        urlencoding::encode(reference),
    );
    if let Some(name) = account_name {
        url.push_str("&accountName=");
        url.push_str(&urlencoding::encode(name));
    }
    url
}

/// Order summary amounts; older orders may lack the breakdown.
#[derive(Debug, Clone, Copy)]
pub struct OrderAmounts {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl From<&Order> for OrderAmounts {
    fn from(order: &Order) -> Self {
        Self {
            subtotal: order
                .subtotal
                .unwrap_or_else(|| order.items.iter().map(|item| item.line_total()).sum()),
            discount: order.discount_amount.unwrap_or_default(),
            shipping: order.shipping_fee.unwrap_or_default(),
            total: order.total_amount,
        }
    }
}

/// Order page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub order: Order,
    pub code: String,
    pub amounts: OrderAmounts,
    pub status_label: &'static str,
    pub status_badge: &'static str,
    pub payment_label: &'static str,
    pub method_label: &'static str,
    pub transfer: Option<TransferView>,
    pub poll: Option<PaymentPoll>,
}

/// Polling fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/payment_status.html")]
pub struct PaymentStatusTemplate {
    pub poll: PaymentPoll,
}

/// Orders are only shown to the session that placed them.
async fn owned_order(session: &Session, id: OrderId) -> Result<PlacedOrder> {
    placed_order(session, id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

fn poll_interval_secs(config: &PaymentConfig) -> u64 {
    config.poll_interval.as_secs().max(1)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the order confirmation page.
#[instrument(skip(state, session), fields(order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<OrderShowTemplate> {
    let placed = owned_order(&session, id).await?;
    let order = state.api().get_order(id).await?;
    let payment = &state.config().payment;

    let transfer = TransferView::for_order(&order, payment);
    let poll = transfer.as_ref().map(|_| {
        let elapsed = Utc::now().signed_duration_since(placed.placed_at);
        PaymentPoll {
            order_id: order.id,
            interval_secs: poll_interval_secs(payment),
            expired: TimeDelta::from_std(payment.poll_timeout).is_ok_and(|t| elapsed >= t),
        }
    });

    Ok(OrderShowTemplate {
        code: order.display_code(),
        amounts: OrderAmounts::from(&order),
        status_label: order.status.label(),
        status_badge: order.status.badge_class(),
        payment_label: order.payment_status.label(),
        method_label: order.payment_method.label(),
        transfer,
        poll,
        order,
    })
}

/// Payment polling fragment (HTMX).
#[instrument(skip(state, session), fields(order_id = %id))]
pub async fn payment_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let placed = owned_order(&session, id).await?;
    let status = state.api().payment_status(id).await?;
    let payment = &state.config().payment;

    let outcome = poll_outcome(&status, placed.placed_at, Utc::now(), payment.poll_timeout);
    tracing::debug!(?outcome, payment_status = ?status.payment_status, "Payment poll");

    let response = match outcome {
        PollOutcome::Settled => {
            tracing::info!(payment_status = ?status.payment_status, "Payment settled");
            (
                AppendHeaders([("HX-Redirect", format!("/orders/{id}"))]),
                (),
            )
                .into_response()
        }
        PollOutcome::Expired | PollOutcome::Waiting => PaymentStatusTemplate {
            poll: PaymentPoll {
                order_id: id,
                interval_secs: poll_interval_secs(payment),
                expired: outcome == PollOutcome::Expired,
            },
        }
        .into_response(),
    };
    Ok(response)
}
