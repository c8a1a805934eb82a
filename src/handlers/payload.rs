//! Raw request bodies and their validation into typed commands.
//!
//! Every field arrives as `Option` so a missing field is reported together with the
//! others instead of failing JSON deserialization on the first one.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::database::models::{
    Credentials, DiscountUpdate, NewDiscount, NewShop, PasswordChange, ShopInfoUpdate,
};
use crate::error::{ApiError, FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 8;

const MAX_NAME_LEN: usize = 100;
const MAX_SHORT_LEN: usize = 50;

/// JSON number or numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            NumberOrString::Number(n) => *n,
            NumberOrString::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    fn is_blank(&self) -> bool {
        matches!(self, NumberOrString::Text(s) if s.trim().is_empty())
    }
}

/// Collects per-field problems so one response can list all of them
#[derive(Debug, Default)]
struct FieldCheck {
    errors: FieldErrors,
}

impl FieldCheck {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    /// Trimmed, non-empty value within `max_len` characters
    fn text(&mut self, field: &str, value: Option<String>, max_len: usize) -> String {
        let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
        if value.is_empty() {
            self.fail(field, format!("{} is required", field));
        } else if value.chars().count() > max_len {
            self.fail(field, format!("{} must be at most {} characters", field, max_len));
        }
        value
    }

    /// Passwords are taken verbatim; surrounding whitespace is significant
    fn password(&mut self, field: &str, value: Option<String>, check_length: bool) -> String {
        let value = value.unwrap_or_default();
        if value.is_empty() {
            self.fail(field, format!("{} is required", field));
        } else if check_length && value.chars().count() < MIN_PASSWORD_LEN {
            self.fail(
                field,
                format!("{} must be at least {} characters", field, MIN_PASSWORD_LEN),
            );
        }
        value
    }

    fn email(&mut self, field: &str, value: Option<String>) -> String {
        let value = self.text(field, value, MAX_NAME_LEN).to_lowercase();
        if !value.is_empty() && !is_email_shaped(&value) {
            self.fail(field, "Please enter a valid email address");
        }
        value
    }

    /// Percentage in [0, 100]; zero is a valid value, not a missing one
    fn percentage(&mut self, field: &str, value: Option<NumberOrString>) -> Decimal {
        let Some(raw) = value.filter(|v| !v.is_blank()) else {
            self.fail(field, format!("{} is required", field));
            return Decimal::ZERO;
        };

        match raw.as_f64().and_then(|v| Decimal::try_from(v).ok()) {
            Some(pct) if pct >= Decimal::ZERO && pct <= Decimal::ONE_HUNDRED => pct.round_dp(2),
            Some(_) => {
                self.fail(field, "Discount percentage must be between 0 and 100");
                Decimal::ZERO
            }
            None => {
                self.fail(field, "Discount percentage must be a number");
                Decimal::ZERO
            }
        }
    }

    fn date(&mut self, field: &str, value: Option<String>) -> Option<NaiveDate> {
        let raw = value.map(|v| v.trim().to_string()).unwrap_or_default();
        if raw.is_empty() {
            self.fail(field, format!("{} is required", field));
            return None;
        }
        let parsed = parse_date(&raw);
        if parsed.is_none() {
            self.fail(field, format!("{} must be a valid date (YYYY-MM-DD)", field));
        }
        parsed
    }

    fn date_range(&mut self, start: Option<String>, end: Option<String>) -> (NaiveDate, NaiveDate) {
        let start = self.date("start_date", start);
        let end = self.date("end_date", end);
        match (start, end) {
            (Some(start), Some(end)) => {
                if end < start {
                    self.fail("end_date", "End date must be on or after the start date");
                }
                (start, end)
            }
            _ => (NaiveDate::MIN, NaiveDate::MIN),
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        match self.errors.len() {
            0 => Ok(()),
            1 => {
                let message = self.errors.values().next().cloned().unwrap_or_default();
                Err(ApiError::validation_error(message, Some(self.errors)))
            }
            _ => {
                let fields: Vec<&str> = self.errors.keys().map(String::as_str).collect();
                let message = format!("Missing or invalid fields: {}", fields.join(", "));
                Err(ApiError::validation_error(message, Some(self.errors)))
            }
        }
    }
}

/// `YYYY-MM-DD`, or the calendar date of an RFC 3339 timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterPayload {
    pub shop_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub city: Option<String>,
}

impl RegisterPayload {
    pub fn validate(self) -> Result<NewShop, ApiError> {
        let mut check = FieldCheck::default();
        let shop = NewShop {
            shop_name: check.text("shop_name", self.shop_name, MAX_NAME_LEN),
            email: check.email("email", self.email),
            password: check.password("password", self.password, true),
            city: check.text("city", self.city, MAX_SHORT_LEN),
        };
        check.finish()?;
        Ok(shop)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginPayload {
    /// Presence only; shape problems fall through to the generic credential failure
    pub fn validate(self) -> Result<Credentials, ApiError> {
        let email = self.email.map(|e| e.trim().to_lowercase()).unwrap_or_default();
        let password = self.password.unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation_error("Email and password are required", None));
        }
        Ok(Credentials { email, password })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ShopInfoPayload {
    pub shop_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

impl ShopInfoPayload {
    pub fn validate(self) -> Result<ShopInfoUpdate, ApiError> {
        let mut check = FieldCheck::default();
        let info = ShopInfoUpdate {
            shop_name: check.text("shop_name", self.shop_name, MAX_NAME_LEN),
            email: check.email("email", self.email),
            city: check.text("city", self.city, MAX_SHORT_LEN),
        };
        check.finish()?;
        Ok(info)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordPayload {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl PasswordPayload {
    pub fn validate(self) -> Result<PasswordChange, ApiError> {
        let mut check = FieldCheck::default();
        let change = PasswordChange {
            current_password: check.password("current_password", self.current_password, false),
            new_password: check.password("new_password", self.new_password, true),
        };
        check.finish()?;
        Ok(change)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscountPayload {
    pub shop_id: Option<NumberOrString>,
    pub title: Option<String>,
    pub discount_percentage: Option<NumberOrString>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DiscountPayload {
    /// An omitted `shop_id` defaults to `default_shop_id`
    pub fn validate(self, default_shop_id: i32) -> Result<NewDiscount, ApiError> {
        let mut check = FieldCheck::default();

        let shop_id = match self.shop_id.filter(|v| !v.is_blank()) {
            None => default_shop_id,
            Some(raw) => match raw.as_f64() {
                Some(v) if v.fract() == 0.0 && v >= 1.0 && v <= f64::from(i32::MAX) => v as i32,
                _ => {
                    check.fail("shop_id", "shop_id must be a valid shop id");
                    default_shop_id
                }
            },
        };

        let title = check.text("title", self.title, MAX_NAME_LEN);
        let discount_percentage = check.percentage("discount_percentage", self.discount_percentage);
        let category = check.text("category", self.category, MAX_SHORT_LEN);
        let (start_date, end_date) = check.date_range(self.start_date, self.end_date);
        check.finish()?;

        Ok(NewDiscount {
            shop_id,
            title,
            discount_percentage,
            category,
            start_date,
            end_date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscountUpdatePayload {
    pub title: Option<String>,
    pub discount_percentage: Option<NumberOrString>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DiscountUpdatePayload {
    pub fn validate(self) -> Result<DiscountUpdate, ApiError> {
        let mut check = FieldCheck::default();
        let title = check.text("title", self.title, MAX_NAME_LEN);
        let discount_percentage = check.percentage("discount_percentage", self.discount_percentage);
        let category = check.text("category", self.category, MAX_SHORT_LEN);
        let (start_date, end_date) = check.date_range(self.start_date, self.end_date);
        check.finish()?;

        Ok(DiscountUpdate {
            title,
            discount_percentage,
            category,
            start_date,
            end_date,
        })
    }
}
