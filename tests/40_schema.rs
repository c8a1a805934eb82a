use anyhow::Result;
use chrono::{TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use discountify::database::init_schema;
use discountify::database::models::Shop;

const LEGACY_SHOPS: &str = r#"
    CREATE TABLE shops (
        id SERIAL PRIMARY KEY,
        shop_name VARCHAR(100) NOT NULL,
        email VARCHAR(100) UNIQUE NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        city VARCHAR(50) NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

const LEGACY_DISCOUNTS: &str = r#"
    CREATE TABLE discounts (
        id SERIAL PRIMARY KEY,
        shop_id INTEGER REFERENCES shops(id) ON DELETE CASCADE,
        title VARCHAR(100) NOT NULL,
        discount_percentage NUMERIC(5,2) NOT NULL CHECK (discount_percentage >= 0 AND discount_percentage <= 100),
        category VARCHAR(50) NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Pool whose connections resolve unqualified tables in `schema`
async fn pool_in_schema(url: &str, schema: &str) -> Result<PgPool> {
    let search_path = format!("SET search_path TO {}", schema);
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                conn.execute(search_path.as_str()).await?;
                Ok(())
            })
        })
        .connect(url)
        .await?;
    Ok(pool)
}

#[tokio::test]
async fn naive_timestamp_tables_are_upgraded_in_place() -> Result<()> {
    let _ = dotenvy::dotenv();
    let Some(url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty()) else {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return Ok(());
    };

    let schema = format!("legacy_{}", uuid::Uuid::new_v4().simple());
    let admin = PgPool::connect(&url).await?;
    admin.execute(format!("CREATE SCHEMA {}", schema).as_str()).await?;

    let outcome = async {
        let pool = pool_in_schema(&url, &schema).await?;
        pool.execute(LEGACY_SHOPS).await?;
        pool.execute(LEGACY_DISCOUNTS).await?;
        pool.execute(
            "INSERT INTO shops (shop_name, email, password_hash, city, created_at, updated_at) \
             VALUES ('Legacy', 'legacy@example.test', 'x', 'Old Town', '2024-01-02 03:04:05', NULL)",
        )
        .await?;

        init_schema(&pool).await?;
        // A second run finds nothing left to convert
        init_schema(&pool).await?;

        let shop: Shop = sqlx::query_as("SELECT id, shop_name, email, city, created_at, updated_at FROM shops")
            .fetch_one(&pool)
            .await?;
        assert_eq!(shop.created_at, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert!(shop.updated_at > shop.created_at, "null timestamps are backfilled");

        let column_types: Vec<(String, String)> = sqlx::query_as(
            "SELECT data_type, is_nullable FROM information_schema.columns \
             WHERE table_schema = $1 AND column_name IN ('created_at', 'updated_at')",
        )
        .bind(&schema)
        .fetch_all(&pool)
        .await?;
        assert_eq!(column_types.len(), 4);
        for (data_type, nullable) in column_types {
            assert_eq!(data_type, "timestamp with time zone");
            assert_eq!(nullable, "NO");
        }

        pool.close().await;
        Ok::<_, anyhow::Error>(())
    }
    .await;

    admin
        .execute(format!("DROP SCHEMA {} CASCADE", schema).as_str())
        .await?;
    outcome
}
