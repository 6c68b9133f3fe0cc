//! # Postgres Checkout Page Store
//!
//! `checkout_pages` table access over a `sqlx` pool. Migrations live in
//! `crates/checkout-api/migrations/` and are embedded into the binary.

use async_trait::async_trait;
use checkout_core::{CheckoutError, CheckoutPage, CheckoutPageStore, CheckoutResult, NewCheckoutPage};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Create a Postgres pool.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply embedded migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

fn db_error(err: sqlx::Error) -> CheckoutError {
    CheckoutError::Database(err.to_string())
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutPageRow {
    id: i32,
    store_name: String,
    store_logo: Option<String>,
    product_name: String,
    product_details: String,
    product_image: Option<String>,
    product_price: String,
    wallet_address: String,
    email: String,
    address: Option<String>,
}

impl From<CheckoutPageRow> for CheckoutPage {
    fn from(row: CheckoutPageRow) -> Self {
        Self {
            id: row.id,
            store_name: row.store_name,
            store_logo: row.store_logo,
            product_name: row.product_name,
            product_details: row.product_details,
            product_image: row.product_image,
            product_price: row.product_price,
            wallet_address: row.wallet_address,
            email: row.email,
            address: row.address,
        }
    }
}

/// Checkout pages stored in Postgres
#[derive(Debug, Clone)]
pub struct PgCheckoutPageStore {
    pool: PgPool,
}

impl PgCheckoutPageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CheckoutPageStore for PgCheckoutPageStore {
    #[instrument(skip(self, page), fields(store = %page.store_name))]
    async fn create(&self, page: NewCheckoutPage) -> CheckoutResult<i32> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO checkout_pages (
                store_name, store_logo, product_name, product_details, product_image,
                product_price, wallet_address, email, address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&page.store_name)
        .bind(&page.store_logo)
        .bind(&page.product_name)
        .bind(&page.product_details)
        .bind(&page.product_image)
        .bind(&page.product_price)
        .bind(&page.wallet_address)
        .bind(&page.email)
        .bind(&page.address)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        debug!("Inserted checkout page {}", id);
        Ok(id)
    }

    async fn get(&self, id: i32) -> CheckoutResult<Option<CheckoutPage>> {
        let row: Option<CheckoutPageRow> = sqlx::query_as(
            r#"
            SELECT id, store_name, store_logo, product_name, product_details, product_image,
                   product_price, wallet_address, email, address
            FROM checkout_pages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(CheckoutPage::from))
    }
}
