use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;

const CREATE_SHOPS: &str = r#"
    CREATE TABLE IF NOT EXISTS shops (
        id SERIAL PRIMARY KEY,
        shop_name VARCHAR(100) NOT NULL,
        email VARCHAR(100) UNIQUE NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        city VARCHAR(50) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

const CREATE_DISCOUNTS: &str = r#"
    CREATE TABLE IF NOT EXISTS discounts (
        id SERIAL PRIMARY KEY,
        shop_id INTEGER NOT NULL REFERENCES shops(id) ON DELETE CASCADE,
        title VARCHAR(100) NOT NULL,
        discount_percentage NUMERIC(5,2) NOT NULL
            CHECK (discount_percentage >= 0 AND discount_percentage <= 100),
        category VARCHAR(50) NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
"#;

const INDEX_DISCOUNTS_SHOP: &str =
    "CREATE INDEX IF NOT EXISTS discounts_shop_id_idx ON discounts (shop_id)";

/// Tables created by earlier deployments hold naive, nullable timestamps; convert them as UTC
const UPGRADE_LEGACY_TIMESTAMPS: &str = r#"
    DO $$
    DECLARE
        col RECORD;
    BEGIN
        FOR col IN
            SELECT table_name, column_name, data_type, is_nullable
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name IN ('shops', 'discounts')
              AND column_name IN ('created_at', 'updated_at')
              AND (data_type = 'timestamp without time zone' OR is_nullable = 'YES')
        LOOP
            IF col.data_type = 'timestamp without time zone' THEN
                EXECUTE format(
                    'ALTER TABLE %I ALTER COLUMN %I TYPE TIMESTAMPTZ USING %I AT TIME ZONE ''UTC''',
                    col.table_name, col.column_name, col.column_name
                );
            END IF;
            IF col.is_nullable = 'YES' THEN
                EXECUTE format(
                    'UPDATE %I SET %I = CURRENT_TIMESTAMP WHERE %I IS NULL',
                    col.table_name, col.column_name, col.column_name
                );
                EXECUTE format('ALTER TABLE %I ALTER COLUMN %I SET NOT NULL', col.table_name, col.column_name);
            END IF;
        END LOOP;
    END
    $$
"#;

const SCHEMA: [&str; 4] = [CREATE_SHOPS, CREATE_DISCOUNTS, INDEX_DISCOUNTS_SHOP, UPGRADE_LEGACY_TIMESTAMPS];

/// Idempotent table creation, run before the listener accepts connections
pub async fn init_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema initialized");
    Ok(())
}
