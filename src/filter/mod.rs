pub mod discount_filter;
pub mod error;
pub mod types;

pub use discount_filter::{escape_like, DiscountFilter, DiscountQuery, LISTING_SELECT};
pub use error::FilterError;
pub use types::*;
