use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::FilterError;

/// Relative validity windows accepted by the `date` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    Today,
    Tomorrow,
    Week,
}

impl DateWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateWindow::Today => "today",
            DateWindow::Tomorrow => "tomorrow",
            DateWindow::Week => "week",
        }
    }

    /// Predicate against CURRENT_DATE; contains no user input
    pub fn to_sql(&self) -> &'static str {
        match self {
            DateWindow::Today => "CURRENT_DATE BETWEEN d.start_date AND d.end_date",
            DateWindow::Tomorrow => "CURRENT_DATE + 1 BETWEEN d.start_date AND d.end_date",
            DateWindow::Week => "(d.start_date <= CURRENT_DATE + 7 AND d.end_date >= CURRENT_DATE)",
        }
    }
}

impl FromStr for DateWindow {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DateWindow::Today),
            "tomorrow" => Ok(DateWindow::Tomorrow),
            "week" => Ok(DateWindow::Week),
            _ => Err(FilterError::InvalidDateWindow(s.to_string())),
        }
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Result ordering for discount listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOrder {
    /// Global board: soonest first
    StartDate(SortDirection),
    /// Owner's dashboard: newest first
    CreatedAt(SortDirection),
}

impl ListingOrder {
    pub fn to_sql(&self) -> String {
        match self {
            ListingOrder::StartDate(dir) => format!("d.start_date {0}, d.id {0}", dir.to_sql()),
            ListingOrder::CreatedAt(dir) => format!("d.created_at {0}, d.id {0}", dir.to_sql()),
        }
    }
}

/// Bound parameter value; user text only ever reaches SQL through these
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParam {
    Int(i32),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterParam>,
}
