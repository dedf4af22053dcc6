//! Checkout route handlers.
//!
//! The storefront only checks the shape of the shipping details. Stock,
//! prices and the coupon are re-checked by the backend when the order is
//! created; a refusal comes back as [`ApiError::Rejected`] and is shown on
//! the form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use roomily_core::model::NewOrder;
use roomily_core::{CouponState, Email, PaymentMethod, PhoneNumber};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::{AppliedCoupon, PlacedOrder, SessionCart, remember_order};
use crate::routes::cart::CartView;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 255;
const MAX_NOTE_LEN: usize = 500;

/// Raw checkout form, kept for re-rendering after an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub payment_method: String,
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutErrors {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub note: Option<String>,
    pub payment_method: Option<String>,
}

impl CheckoutErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.note.is_none()
            && self.payment_method.is_none()
    }
}

/// Shipping details that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub customer_name: String,
    pub phone: PhoneNumber,
    pub email: Option<Email>,
    pub address: String,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Validate the checkout form.
///
/// # Errors
///
/// Returns every failing field at once.
pub fn validate(form: &CheckoutForm) -> std::result::Result<CheckoutDetails, CheckoutErrors> {
    let mut errors = CheckoutErrors::default();

    let customer_name = form.customer_name.trim();
    if customer_name.is_empty() {
        errors.customer_name = Some("Please enter your name.".to_string());
    } else if customer_name.chars().count() > MAX_NAME_LEN {
        errors.customer_name = Some(format!("Name must be at most {MAX_NAME_LEN} characters."));
    }

    let phone = PhoneNumber::parse(&form.phone)
        .map_err(|e| errors.phone = Some(capitalize(&e.to_string())))
        .ok();

    let email = match form.email.trim() {
        "" => None,
        raw => Email::parse(raw)
            .map_err(|e| errors.email = Some(capitalize(&e.to_string())))
            .ok(),
    };

    let address = form.address.trim();
    if address.is_empty() {
        errors.address = Some("Please enter a delivery address.".to_string());
    } else if address.chars().count() > MAX_ADDRESS_LEN {
        errors.address = Some(format!(
            "Address must be at most {MAX_ADDRESS_LEN} characters."
        ));
    }

    let note = form.note.trim();
    if note.chars().count() > MAX_NOTE_LEN {
        errors.note = Some(format!("Note must be at most {MAX_NOTE_LEN} characters."));
    }

    let payment_method = if form.payment_method.trim().is_empty() {
        Some(PaymentMethod::default())
    } else {
        form.payment_method
            .parse::<PaymentMethod>()
            .map_err(|_| errors.payment_method = Some("Choose a payment method.".to_string()))
            .ok()
    };

    match (phone, payment_method) {
        (Some(phone), Some(payment_method)) if errors.is_empty() => Ok(CheckoutDetails {
            customer_name: customer_name.to_string(),
            phone,
            email,
            address: address.to_string(),
            note: (!note.is_empty()).then(|| note.to_string()),
            payment_method,
        }),
        _ => Err(errors),
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub cart: CartView,
    pub form: CheckoutForm,
    pub errors: CheckoutErrors,
    /// Error that is not tied to a field (coupon, stock, backend refusal).
    pub error: Option<String>,
    pub bank_transfer_selected: bool,
}

impl CheckoutTemplate {
    fn new(state: &AppState, cart: &SessionCart, form: CheckoutForm) -> Self {
        let bank_transfer_selected = form.payment_method.parse::<PaymentMethod>().ok()
            == Some(PaymentMethod::BankTransfer);
        Self {
            cart: CartView::new(cart, &state.config().shipping),
            form,
            errors: CheckoutErrors::default(),
            error: None,
            bank_transfer_selected,
        }
    }

    fn with_errors(mut self, errors: CheckoutErrors) -> Self {
        self.errors = errors;
        self
    }

    fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    fn rejected(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Response {
    let cart = SessionCart::load(&session).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }
    CheckoutTemplate::new(&state, &cart, CheckoutForm::default()).into_response()
}

/// Validate the form, re-check the coupon, and place the order.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let mut cart = SessionCart::load(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let details = match validate(&form) {
        Ok(details) => details,
        Err(errors) => {
            return Ok(CheckoutTemplate::new(&state, &cart, form)
                .with_errors(errors)
                .rejected());
        }
    };

    if let Some(applied) = cart.coupon.clone() {
        let problem = match state
            .api()
            .validate_coupon(&applied.code, cart.subtotal())
            .await
        {
            Ok(coupon) if coupon.state_at(Utc::now()) == CouponState::Active => {
                cart.coupon = Some(AppliedCoupon {
                    code: coupon.code,
                    percent: coupon.discount_percent,
                });
                None
            }
            Ok(coupon) => Some(format!(
                "Coupon {} is no longer usable ({}).",
                applied.code,
                coupon.state_at(Utc::now()).label().to_lowercase()
            )),
            Err(ApiError::Rejected(message)) => Some(message),
            Err(e) => return Err(e.into()),
        };

        if let Some(problem) = problem {
            tracing::info!(code = %applied.code, "Dropping coupon rejected at checkout");
            cart.coupon = None;
            cart.save(&session).await?;
            return Ok(CheckoutTemplate::new(&state, &cart, form)
                .with_error(format!("{problem} It has been removed; please review your total."))
                .rejected());
        }
    }

    let new_order = NewOrder {
        customer_name: details.customer_name,
        phone: details.phone.as_str().to_string(),
        email: details.email.map(Email::into_inner),
        address: details.address,
        note: details.note,
        payment_method: details.payment_method,
        coupon_code: cart.coupon.as_ref().map(|c| c.code.clone()),
        items: cart.order_items(),
    };

    let order = match state.api().create_order(&new_order).await {
        Ok(order) => order,
        Err(ApiError::Rejected(message)) => {
            tracing::info!("Order rejected by backend: {message}");
            return Ok(CheckoutTemplate::new(&state, &cart, form)
                .with_error(message)
                .rejected());
        }
        Err(e) => return Err(e.into()),
    };

    remember_order(
        &session,
        PlacedOrder {
            id: order.id,
            placed_at: Utc::now(),
        },
    )
    .await?;
    cart.clear();
    cart.save(&session).await?;

    tracing::info!(
        order_id = %order.id,
        payment_method = ?order.payment_method,
        total = %order.total_amount,
        "Order placed"
    );
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );

    Ok(Redirect::to(&format!("/orders/{}", order.id)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: "  Nguyễn Lan ".to_string(),
            phone: "090 123 4567".to_string(),
            email: String::new(),
            address: "12 Lý Thường Kiệt, Hà Nội".to_string(),
            note: String::new(),
            payment_method: "BANK_TRANSFER".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let details = validate(&form()).unwrap();
        assert_eq!(details.customer_name, "Nguyễn Lan");
        assert_eq!(details.phone.as_str(), "0901234567");
        assert!(details.email.is_none());
        assert!(details.note.is_none());
        assert_eq!(details.payment_method, PaymentMethod::BankTransfer);
    }

    #[test]
    fn test_missing_payment_method_defaults_to_cod() {
        let details = validate(&CheckoutForm {
            payment_method: String::new(),
            ..form()
        })
        .unwrap();
        assert_eq!(details.payment_method, PaymentMethod::Cod);
    }

    #[test]
    fn test_collects_every_error() {
        let errors = validate(&CheckoutForm {
            customer_name: " ".to_string(),
            phone: "12".to_string(),
            email: "not-an-email".to_string(),
            address: String::new(),
            note: String::new(),
            payment_method: "PAYPAL".to_string(),
        })
        .unwrap_err();

        assert!(errors.customer_name.is_some());
        assert!(errors.phone.is_some());
        assert_eq!(
            errors.email.as_deref(),
            Some("Email must contain an @ symbol.")
        );
        assert!(errors.address.is_some());
        assert!(errors.note.is_none());
        assert!(errors.payment_method.is_some());
    }

    #[test]
    fn test_optional_email_is_parsed() {
        let details = validate(&CheckoutForm {
            email: "lan@example.com".to_string(),
            ..form()
        })
        .unwrap();
        assert_eq!(details.email.unwrap().as_str(), "lan@example.com");
    }

    #[test]
    fn test_note_length_limit() {
        let errors = validate(&CheckoutForm {
            note: "x".repeat(MAX_NOTE_LEN + 1),
            ..form()
        })
        .unwrap_err();
        assert!(errors.note.is_some());
        assert!(errors.phone.is_none());
    }
}
