use sqlx::{self, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Discount, DiscountListing, DiscountUpdate, NewDiscount, NewShop, Shop, ShopInfoUpdate, ShopWithHash,
};
use crate::database::query_builder::ListingQuery;
use crate::filter::{DiscountFilter, ListingOrder, LISTING_SELECT};

const SHOP_COLUMNS: &str = "id, shop_name, email, city, created_at, updated_at";
const DISCOUNT_COLUMNS: &str =
    "id, shop_id, title, discount_percentage, category, start_date, end_date, created_at, updated_at";

fn shop_not_found() -> DatabaseError {
    DatabaseError::NotFound("Shop not found".to_string())
}

fn discount_not_found() -> DatabaseError {
    DatabaseError::NotFound("Discount not found".to_string())
}

#[derive(Clone)]
pub struct ShopRepository {
    pool: PgPool,
}

impl ShopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All shops, newest first
    pub async fn select_all(&self) -> Result<Vec<Shop>, DatabaseError> {
        let query = format!("SELECT {} FROM shops ORDER BY created_at DESC, id DESC", SHOP_COLUMNS);
        let rows = sqlx::query_as::<_, Shop>(&query).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn select_404(&self, id: i32) -> Result<Shop, DatabaseError> {
        let query = format!("SELECT {} FROM shops WHERE id = $1", SHOP_COLUMNS);
        sqlx::query_as::<_, Shop>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(shop_not_found)
    }

    /// Credential lookup; the only query that reads `password_hash`
    pub async fn find_by_email(&self, email: &str) -> Result<Option<ShopWithHash>, DatabaseError> {
        let query = format!("SELECT {}, password_hash FROM shops WHERE email = $1", SHOP_COLUMNS);
        let row = sqlx::query_as::<_, ShopWithHash>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn insert(&self, shop: &NewShop, password_hash: &str) -> Result<Shop, DatabaseError> {
        let query = format!(
            "INSERT INTO shops (shop_name, email, password_hash, city) VALUES ($1, $2, $3, $4) RETURNING {}",
            SHOP_COLUMNS
        );
        let row = sqlx::query_as::<_, Shop>(&query)
            .bind(&shop.shop_name)
            .bind(&shop.email)
            .bind(password_hash)
            .bind(&shop.city)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_info(&self, id: i32, info: &ShopInfoUpdate) -> Result<Shop, DatabaseError> {
        let query = format!(
            "UPDATE shops SET shop_name = $1, email = $2, city = $3, updated_at = CURRENT_TIMESTAMP \
             WHERE id = $4 RETURNING {}",
            SHOP_COLUMNS
        );
        sqlx::query_as::<_, Shop>(&query)
            .bind(&info.shop_name)
            .bind(&info.email)
            .bind(&info.city)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(shop_not_found)
    }

    pub async fn password_hash(&self, id: i32) -> Result<Option<String>, DatabaseError> {
        let stored = sqlx::query_scalar("SELECT password_hash FROM shops WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stored)
    }

    /// Store `new_hash` only while the row still holds `expected_hash`; false when it no longer does
    pub async fn replace_password_hash(
        &self,
        id: i32,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE shops SET password_hash = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND password_hash = $3",
        )
        .bind(new_hash)
        .bind(id)
        .bind(expected_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Delete the shop; its discounts go with it through the cascading foreign key
    pub async fn delete(&self, id: i32) -> Result<Shop, DatabaseError> {
        let query = format!("DELETE FROM shops WHERE id = $1 RETURNING {}", SHOP_COLUMNS);
        sqlx::query_as::<_, Shop>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(shop_not_found)
    }
}

#[derive(Clone)]
pub struct DiscountRepository {
    pool: PgPool,
}

impl DiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn select_listings(
        &self,
        filter: DiscountFilter,
        order: ListingOrder,
    ) -> Result<Vec<DiscountListing>, DatabaseError> {
        ListingQuery::new().filter(filter).order(order).select_all(&self.pool).await
    }

    pub async fn select_listing_404(&self, id: i32) -> Result<DiscountListing, DatabaseError> {
        let query = format!("{} WHERE d.id = $1", LISTING_SELECT);
        sqlx::query_as::<_, DiscountListing>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(discount_not_found)
    }

    /// Owning shop of a discount, if the discount exists
    pub async fn owner_of(&self, id: i32) -> Result<Option<i32>, DatabaseError> {
        let owner = sqlx::query_scalar("SELECT shop_id FROM discounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    pub async fn insert(&self, discount: &NewDiscount) -> Result<Discount, DatabaseError> {
        let query = format!(
            "INSERT INTO discounts (shop_id, title, discount_percentage, category, start_date, end_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            DISCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, Discount>(&query)
            .bind(discount.shop_id)
            .bind(&discount.title)
            .bind(discount.discount_percentage)
            .bind(&discount.category)
            .bind(discount.start_date)
            .bind(discount.end_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Full replacement, limited to rows owned by `shop_id`
    pub async fn update(&self, id: i32, shop_id: i32, update: &DiscountUpdate) -> Result<Discount, DatabaseError> {
        let query = format!(
            "UPDATE discounts SET title = $1, discount_percentage = $2, category = $3, start_date = $4, \
             end_date = $5, updated_at = CURRENT_TIMESTAMP WHERE id = $6 AND shop_id = $7 RETURNING {}",
            DISCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Discount>(&query)
            .bind(&update.title)
            .bind(update.discount_percentage)
            .bind(&update.category)
            .bind(update.start_date)
            .bind(update.end_date)
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(discount_not_found)
    }

    pub async fn delete(&self, id: i32, shop_id: i32) -> Result<Discount, DatabaseError> {
        let query = format!(
            "DELETE FROM discounts WHERE id = $1 AND shop_id = $2 RETURNING {}",
            DISCOUNT_COLUMNS
        );
        sqlx::query_as::<_, Discount>(&query)
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(discount_not_found)
    }
}
