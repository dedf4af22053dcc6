//! Form parsing and validation.
//!
//! Browser forms arrive as strings. Each form type keeps the raw values so a
//! rejected form can be shown again exactly as typed, and `validate` turns it
//! into the backend payload or a set of per-field messages. The backend
//! re-validates everything; these checks only save a round trip.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use roomily_core::model::{Banner, Category, Coupon, Product};
use roomily_core::{CategoryId, DiscountPercent};
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::api::{BannerInput, CategoryInput, CouponInput, ProductInput};

/// Offset used for the date pickers (Indochina Time).
const STORE_UTC_OFFSET_SECS: i32 = 7 * 60 * 60;

/// Format of `<input type="datetime-local">` values.
const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

const MAX_NAME_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 2000;

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for a field, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// =============================================================================
// Products
// =============================================================================

/// Raw product form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub original_price: String,
    pub stock: String,
    pub category_id: String,
    /// One image URL per line.
    pub images: String,
    pub material: String,
    pub size: String,
    pub fault_note: String,
    /// Checkbox; present when ticked.
    pub active: Option<String>,
}

impl ProductForm {
    /// Empty form for a new product.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            stock: "1".to_string(),
            active: Some("on".to_string()),
            ..Self::default()
        }
    }

    /// Whether the active checkbox is ticked.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Selected category ID as submitted.
    #[must_use]
    pub fn selected_category(&self) -> Option<CategoryId> {
        self.category_id.trim().parse().ok()
    }

    /// Validate into a backend payload.
    ///
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<ProductInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = required_text(&mut errors, "name", &self.name, MAX_NAME_LEN);

        let price = match parse_decimal(&self.price) {
            Some(price) if price > Decimal::ZERO => Some(price),
            Some(_) => {
                errors.add("price", "Price must be greater than zero.");
                None
            }
            None => {
                errors.add("price", "Enter a price.");
                None
            }
        };

        let original_price = match self.original_price.trim() {
            "" => None,
            raw => match parse_decimal(raw) {
                Some(value) if value > Decimal::ZERO => Some(value),
                _ => {
                    errors.add("original_price", "Original price must be a positive number.");
                    None
                }
            },
        };

        let stock = match self.stock.trim() {
            "" => Some(0),
            raw => match raw.parse::<i64>() {
                Ok(n) if n < 0 => {
                    errors.add("stock", "Stock cannot be negative.");
                    None
                }
                Ok(n) => u32::try_from(n)
                    .map_err(|_| errors.add("stock", "Stock is too large."))
                    .ok(),
                Err(_) => {
                    errors.add("stock", "Stock must be a whole number.");
                    None
                }
            },
        };

        let category_id = match self.category_id.trim() {
            "" => None,
            raw => raw
                .parse::<CategoryId>()
                .map_err(|_| errors.add("category_id", "Choose a category."))
                .ok(),
        };

        let images: Vec<String> = self
            .images
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if images.iter().any(|image| !is_http_url(image)) {
            errors.add("images", "Every image must be an http(s) URL.");
        }

        let description = optional_text(&mut errors, "description", &self.description);
        let fault_note = optional_text(&mut errors, "fault_note", &self.fault_note);

        match (name, price, stock) {
            (Some(name), Some(price), Some(stock)) if errors.is_empty() => Ok(ProductInput {
                name,
                description,
                price,
                original_price,
                stock,
                category_id,
                images,
                material: non_empty(&self.material),
                size: non_empty(&self.size),
                fault_note,
                active: self.is_active(),
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.normalize().to_string(),
            original_price: product
                .original_price
                .map(|p| p.normalize().to_string())
                .unwrap_or_default(),
            stock: product.stock.to_string(),
            category_id: product
                .category
                .as_ref()
                .map(|c| c.id.to_string())
                .unwrap_or_default(),
            images: product.images.join("\n"),
            material: product.material.clone().unwrap_or_default(),
            size: product.size.clone().unwrap_or_default(),
            fault_note: product.fault_note.clone().unwrap_or_default(),
            active: product.active.then(|| "on".to_string()),
        }
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Raw category form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub image_url: String,
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<CategoryInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = required_text(&mut errors, "name", &self.name, 100);
        let description = optional_text(&mut errors, "description", &self.description);
        let image_url = non_empty(&self.image_url);
        if image_url.as_deref().is_some_and(|url| !is_http_url(url)) {
            errors.add("image_url", "Image must be an http(s) URL.");
        }

        match name {
            Some(name) if errors.is_empty() => Ok(CategoryInput {
                name,
                description,
                image_url,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            image_url: category.image_url.clone().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// Raw coupon form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CouponForm {
    pub code: String,
    pub discount_percent: String,
    pub description: String,
    /// `datetime-local` value in store time.
    pub start_date: String,
    /// `datetime-local` value in store time.
    pub end_date: String,
    pub usage_limit: String,
}

impl CouponForm {
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<CouponInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let code = self.code.trim().to_ascii_uppercase();
        if !is_valid_coupon_code(&code) {
            errors.add(
                "code",
                "Code must be 3-32 characters: letters, digits, '-' or '_'.",
            );
        }

        let discount_percent = match parse_decimal(&self.discount_percent) {
            Some(percent) if percent >= Decimal::ONE && percent <= Decimal::ONE_HUNDRED => {
                DiscountPercent::new(percent).ok()
            }
            _ => None,
        };
        if discount_percent.is_none() {
            errors.add("discount_percent", "Discount must be between 1 and 100 percent.");
        }

        let start_date = parse_local_datetime(&mut errors, "start_date", &self.start_date);
        let end_date = parse_local_datetime(&mut errors, "end_date", &self.end_date);
        if let (Some(start), Some(end)) = (start_date, end_date)
            && end <= start
        {
            errors.add("end_date", "End date must be after the start date.");
        }

        let usage_limit = match self.usage_limit.trim() {
            "" => None,
            raw => match raw.parse::<u32>() {
                Ok(limit) if limit > 0 => Some(limit),
                _ => {
                    errors.add("usage_limit", "Usage limit must be a positive whole number.");
                    None
                }
            },
        };

        let description = optional_text(&mut errors, "description", &self.description);

        match discount_percent {
            Some(discount_percent) if errors.is_empty() => Ok(CouponInput {
                code,
                discount_percent,
                description,
                start_date,
                end_date,
                usage_limit,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Coupon> for CouponForm {
    fn from(coupon: &Coupon) -> Self {
        Self {
            code: coupon.code.clone(),
            discount_percent: coupon.discount_percent.value().normalize().to_string(),
            description: coupon.description.clone().unwrap_or_default(),
            start_date: coupon.start_date.map(to_local_input).unwrap_or_default(),
            end_date: coupon.end_date.map(to_local_input).unwrap_or_default(),
            usage_limit: coupon
                .usage_limit
                .map(|limit| limit.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Whether a code matches `[A-Z0-9_-]{3,32}`.
#[must_use]
pub fn is_valid_coupon_code(code: &str) -> bool {
    (3..=32).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

// =============================================================================
// Banners
// =============================================================================

/// Raw banner form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BannerForm {
    pub title: String,
    pub subtitle: String,
    pub image_url: String,
    pub link_url: String,
    pub position: String,
    /// Checkbox; present when ticked.
    pub active: Option<String>,
}

impl BannerForm {
    /// Empty form for a new banner.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            position: "0".to_string(),
            active: Some("on".to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<BannerInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = required_text(&mut errors, "title", &self.title, MAX_NAME_LEN);

        let image_url = self.image_url.trim();
        if image_url.is_empty() {
            errors.add("image_url", "Enter an image URL.");
        } else if !is_http_url(image_url) {
            errors.add("image_url", "Image must be an http(s) URL.");
        }

        let link_url = non_empty(&self.link_url);
        if link_url
            .as_deref()
            .is_some_and(|link| !(is_site_path(link) || is_http_url(link)))
        {
            errors.add("link_url", "Link must be a site path (/products) or an http(s) URL.");
        }

        let position = match self.position.trim() {
            "" => Some(0),
            raw => raw
                .parse::<i32>()
                .map_err(|_| errors.add("position", "Position must be a whole number."))
                .ok(),
        };

        match (title, position) {
            (Some(title), Some(position)) if errors.is_empty() => Ok(BannerInput {
                title,
                subtitle: non_empty(&self.subtitle),
                image_url: image_url.to_string(),
                link_url,
                position,
                active: self.is_active(),
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Banner> for BannerForm {
    fn from(banner: &Banner) -> Self {
        Self {
            title: banner.title.clone(),
            subtitle: banner.subtitle.clone().unwrap_or_default(),
            image_url: banner.image_url.clone(),
            link_url: banner.link_url.clone().unwrap_or_default(),
            position: banner.position.to_string(),
            active: banner.active.then(|| "on".to_string()),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn required_text(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    max_len: usize,
) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
        None
    } else if value.chars().count() > max_len {
        errors.add(field, format!("Must be at most {max_len} characters."));
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_text(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<String> {
    let value = non_empty(raw)?;
    if value.chars().count() > MAX_TEXT_LEN {
        errors.add(field, format!("Must be at most {MAX_TEXT_LEN} characters."));
        return None;
    }
    Some(value)
}

fn non_empty(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse a number typed by a person: `250000`, `250,000`, `1.250.000 ₫`,
/// `12.5` or `2,5`.
///
/// A separator that only splits off groups of exactly three digits is a
/// thousands separator. Otherwise a single `,` or `.` is the decimal point.
/// When both appear, the last one is the decimal point.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '₫'))
        .collect();

    let (whole, fraction, thousands) = match (cleaned.contains(','), cleaned.contains('.')) {
        (false, false) => return cleaned.parse().ok(),
        (true, true) => {
            let at = cleaned.rfind([',', '.'])?;
            let (whole, fraction) = cleaned.split_at(at);
            let thousands = if fraction.starts_with(',') { '.' } else { ',' };
            (whole, Some(fraction.get(1..)?), thousands)
        }
        (has_comma, _) => {
            let sep = if has_comma { ',' } else { '.' };
            if is_grouped(&cleaned, sep) {
                (cleaned.as_str(), None, sep)
            } else {
                let (whole, fraction) = cleaned.split_once(sep)?;
                (whole, Some(fraction), sep)
            }
        }
    };

    if whole.contains(thousands) && !is_grouped(whole, thousands) {
        return None;
    }
    let mut number = whole.replace(thousands, "");
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        number.push('.');
        number.push_str(fraction);
    }
    number.parse().ok()
}

/// `1,250,000` style grouping: a non-empty head, then 3-digit groups.
fn is_grouped(raw: &str, sep: char) -> bool {
    let mut groups = raw.split(sep);
    let head_ok = groups.next().is_some_and(|head| {
        let digits = head.trim_start_matches('-');
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    });
    let mut rest = groups.peekable();
    head_ok
        && rest.peek().is_some()
        && rest.all(|group| group.len() == 3 && group.bytes().all(|b| b.is_ascii_digit()))
}

fn is_site_path(raw: &str) -> bool {
    raw.starts_with('/') && !raw.starts_with("//")
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

fn store_offset() -> FixedOffset {
    FixedOffset::east_opt(STORE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn parse_local_datetime(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let naive = NaiveDateTime::parse_from_str(raw, DATETIME_LOCAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"));
    match naive.ok().and_then(|n| store_offset().from_local_datetime(&n).single()) {
        Some(local) => Some(local.with_timezone(&Utc)),
        None => {
            errors.add(field, "Enter a valid date and time.");
            None
        }
    }
}

/// Render a timestamp for a `datetime-local` input in store time.
#[must_use]
pub fn to_local_input(at: DateTime<Utc>) -> String {
    at.with_timezone(&store_offset())
        .format(DATETIME_LOCAL_FORMAT)
        .to_string()
}

/// Render a timestamp for tables in store time.
#[must_use]
pub fn to_local_display(at: DateTime<Utc>) -> String {
    at.with_timezone(&store_offset())
        .format("%d/%m/%Y %H:%M")
        .to_string()
}
