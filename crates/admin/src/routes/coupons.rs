//! Coupon management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use roomily_core::model::Coupon;
use roomily_core::{CouponId, CouponState};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::AdminApiError;
use crate::error::Result;
use crate::filters;
use crate::forms::{CouponForm, FieldErrors, to_local_display};
use crate::middleware::{RequireAdminAuth, RequireFullAdmin};
use crate::routes::{Layout, delete_response, saved};
use crate::state::AppState;

/// One coupon table row.
#[derive(Debug, Clone)]
pub struct CouponRow {
    pub coupon: Coupon,
    pub state: CouponState,
    /// "12/10/2026 00:00 - 31/10/2026 23:59", or "No time limit".
    pub validity: String,
    /// "3 / 100", or "3 / unlimited".
    pub usage: String,
}

impl CouponRow {
    fn new(coupon: Coupon, now: chrono::DateTime<Utc>) -> Self {
        let validity = match (coupon.start_date, coupon.end_date) {
            (None, None) => "No time limit".to_string(),
            (Some(start), None) => format!("From {}", to_local_display(start)),
            (None, Some(end)) => format!("Until {}", to_local_display(end)),
            (Some(start), Some(end)) => {
                format!("{} - {}", to_local_display(start), to_local_display(end))
            }
        };
        let usage = match coupon.usage_limit {
            Some(limit) => format!("{} / {limit}", coupon.used_count),
            None => format!("{} / unlimited", coupon.used_count),
        };
        Self {
            state: coupon.state_at(now),
            coupon,
            validity,
            usage,
        }
    }
}

/// Coupon table template.
#[derive(Template, WebTemplate)]
#[template(path = "coupons/index.html")]
pub struct CouponsIndexTemplate {
    pub layout: Layout,
    pub coupons: Vec<CouponRow>,
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "coupons/form.html")]
pub struct CouponFormTemplate {
    pub layout: Layout,
    pub form: CouponForm,
    pub action: String,
    pub is_edit: bool,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl CouponFormTemplate {
    fn new(layout: Layout, form: CouponForm, action: String) -> Self {
        Self {
            layout,
            is_edit: action != "/coupons",
            form,
            action,
            errors: FieldErrors::default(),
            error: None,
        }
    }

    fn rejected(mut self, errors: FieldErrors, error: Option<String>) -> Response {
        self.errors = errors;
        self.error = error;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

/// Every coupon with its current state.
#[instrument(skip(state, admin, session))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> Result<CouponsIndexTemplate> {
    let now = Utc::now();
    let coupons = state
        .api()
        .list_coupons(&admin.token)
        .await?
        .into_iter()
        .map(|coupon| CouponRow::new(coupon, now))
        .collect();

    Ok(CouponsIndexTemplate {
        layout: Layout::new(&admin, "coupons", &session).await,
        coupons,
    })
}

#[instrument(skip(admin, session))]
pub async fn new_coupon(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
) -> CouponFormTemplate {
    CouponFormTemplate::new(
        Layout::new(&admin, "coupons", &session).await,
        CouponForm::default(),
        "/coupons".to_string(),
    )
}

#[instrument(skip(state, admin, session, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let layout = Layout::new(&admin, "coupons", &session).await;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                CouponFormTemplate::new(layout, form, "/coupons".to_string()).rejected(errors, None),
            );
        }
    };

    match state.api().create_coupon(&admin.token, &input).await {
        Ok(coupon) => {
            tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");
            saved(
                &session,
                format!("Coupon {} created.", coupon.code),
                "/coupons",
            )
            .await
        }
        Err(AdminApiError::Rejected(message)) => {
            Ok(CouponFormTemplate::new(layout, form, "/coupons".to_string())
                .rejected(FieldErrors::default(), Some(message)))
        }
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(state, admin, session))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<CouponId>,
) -> Result<CouponFormTemplate> {
    let coupon = state.api().get_coupon(&admin.token, id).await?;
    Ok(CouponFormTemplate::new(
        Layout::new(&admin, "coupons", &session).await,
        CouponForm::from(&coupon),
        format!("/coupons/{id}"),
    ))
}

#[instrument(skip(state, admin, session, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    Path(id): Path<CouponId>,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let layout = Layout::new(&admin, "coupons", &session).await;
    let action = format!("/coupons/{id}");
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(CouponFormTemplate::new(layout, form, action).rejected(errors, None));
        }
    };

    match state.api().update_coupon(&admin.token, id, &input).await {
        Ok(coupon) => {
            tracing::info!(coupon_id = %id, "Coupon updated");
            saved(&session, format!("Coupon {} saved.", coupon.code), "/coupons").await
        }
        Err(AdminApiError::Rejected(message)) => Ok(CouponFormTemplate::new(layout, form, action)
            .rejected(FieldErrors::default(), Some(message))),
        Err(e) => Err(e.into()),
    }
}

/// Delete a coupon (ADMIN role only).
#[instrument(skip(state, admin, session, headers))]
pub async fn delete(
    State(state): State<AppState>,
    RequireFullAdmin(admin): RequireFullAdmin,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<CouponId>,
) -> Result<Response> {
    let result = state.api().delete_coupon(&admin.token, id).await;
    delete_response(&headers, &session, result, &format!("Coupon #{id}"), "/coupons").await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use roomily_core::DiscountPercent;
    use rust_decimal::Decimal;

    use super::*;

    fn coupon() -> Coupon {
        Coupon {
            id: CouponId::new(4),
            code: "AUTUMN10".to_string(),
            discount_percent: DiscountPercent::new(Decimal::new(10, 0)).unwrap(),
            description: None,
            start_date: Some(Utc.with_ymd_and_hms(2026, 9, 30, 17, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2026, 10, 31, 16, 59, 0).unwrap()),
            usage_limit: Some(100),
            used_count: 3,
        }
    }

    #[test]
    fn test_row_shows_store_time_and_usage() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let row = CouponRow::new(coupon(), now);
        assert_eq!(row.state, CouponState::Active);
        assert_eq!(row.validity, "01/10/2026 00:00 - 31/10/2026 23:59");
        assert_eq!(row.usage, "3 / 100");
    }

    #[test]
    fn test_row_without_limits() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        let row = CouponRow::new(
            Coupon {
                start_date: None,
                end_date: None,
                usage_limit: None,
                ..coupon()
            },
            now,
        );
        assert_eq!(row.validity, "No time limit");
        assert_eq!(row.usage, "3 / unlimited");
    }
}
