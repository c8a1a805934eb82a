use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Public view of a shop; the password hash never leaves the database layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Shop {
    pub id: i32,
    pub shop_name: String,
    pub email: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shop row including the stored hash, used only for credential checks
#[derive(Debug, Clone, FromRow)]
pub struct ShopWithHash {
    #[sqlx(flatten)]
    pub shop: Shop,
    pub password_hash: String,
}

/// Validated registration command; the password is still plaintext here
#[derive(Debug, Clone, PartialEq)]
pub struct NewShop {
    pub shop_name: String,
    pub email: String,
    pub password: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopInfoUpdate {
    pub shop_name: String,
    pub email: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}
