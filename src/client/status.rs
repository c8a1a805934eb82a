use chrono::NaiveDate;
use std::fmt;

use crate::database::models::Discount;

/// Where a discount's validity window sits relative to a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountStatus {
    Active,
    Expired,
    Upcoming,
}

impl DiscountStatus {
    /// Both ends of the window are inclusive
    pub fn classify(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> Self {
        if today > end_date {
            DiscountStatus::Expired
        } else if today >= start_date {
            DiscountStatus::Active
        } else {
            DiscountStatus::Upcoming
        }
    }

    pub fn of(discount: &Discount, today: NaiveDate) -> Self {
        Self::classify(discount.start_date, discount.end_date, today)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiscountStatus::Active => "Active",
            DiscountStatus::Expired => "Expired",
            DiscountStatus::Upcoming => "Upcoming",
        }
    }
}

impl fmt::Display for DiscountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Calendar days until the window closes; negative once expired
pub fn days_left(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

/// One-line countdown shown under an active or expired discount
pub fn countdown(discount: &Discount, today: NaiveDate) -> Option<String> {
    match DiscountStatus::of(discount, today) {
        DiscountStatus::Active => {
            let days = days_left(discount.end_date, today);
            let unit = if days == 1 { "day" } else { "days" };
            Some(format!("Sale ends in {} {}", days, unit))
        }
        DiscountStatus::Expired => Some(format!("Expired on {}", discount.end_date.format("%b %-d, %Y"))),
        DiscountStatus::Upcoming => None,
    }
}
