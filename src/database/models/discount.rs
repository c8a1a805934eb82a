use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Discount {
    pub id: i32,
    pub shop_id: i32,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Discount joined with the owning shop's display fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DiscountListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub discount: Discount,
    pub shop_name: String,
    pub city: String,
}

/// Validated insert command
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiscount {
    pub shop_id: i32,
    pub title: String,
    pub discount_percentage: Decimal,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Validated full-replacement update
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountUpdate {
    pub title: String,
    pub discount_percentage: Decimal,
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
