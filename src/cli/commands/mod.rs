pub mod auth;
pub mod discount;
pub mod shop;
