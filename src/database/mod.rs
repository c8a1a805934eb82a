pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;
pub mod schema;

pub use manager::{DatabaseError, DatabaseManager};
pub use query_builder::ListingQuery;
pub use repository::{DiscountRepository, ShopRepository};
pub use schema::init_schema;
