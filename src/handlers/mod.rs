// Resource handlers. Routes and their auth policy are wired in `app`.
pub mod auth;
pub mod discounts;
pub mod payload;
pub mod shops;
pub mod system;

use crate::error::ApiError;

/// Positive integer id from a path segment
pub(crate) fn parse_id(raw: &str, resource: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::invalid_field("id", format!("Invalid {} id", resource)))
}
