use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use super::Database;
use crate::models::{Cart, CartItem, CartItemRecord, RepositoryError, RepositoryResult};

/// Trait defining the interface for cart data access operations
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Cart lines of a customer joined with their products, oldest first
    async fn find_cart(&self, customer_id: i64) -> RepositoryResult<Cart>;

    /// A single line, only when it belongs to the customer
    async fn find_item(
        &self,
        customer_id: i64,
        item_id: i64,
    ) -> RepositoryResult<Option<CartItemRecord>>;

    /// Insert a line or add to the quantity of the existing one
    async fn add_item(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<CartItemRecord>;

    async fn update_quantity(&self, item_id: i64, quantity: i32) -> RepositoryResult<()>;

    /// False when the customer has no such line
    async fn remove_item(&self, customer_id: i64, item_id: i64) -> RepositoryResult<bool>;

    /// Delete every line of the customer, returning how many were removed
    async fn clear(&self, customer_id: i64) -> RepositoryResult<u64>;
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRecordRow {
    id: i64,
    customer_id: i64,
    product_id: i64,
    quantity: i32,
    created_on: DateTime<Utc>,
    latest_updated_on: DateTime<Utc>,
}

impl From<CartItemRecordRow> for CartItemRecord {
    fn from(row: CartItemRecordRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_on: row.created_on,
            latest_updated_on: row.latest_updated_on,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i64,
    product_id: i64,
    product_name: String,
    product_image: Option<String>,
    unit_price: Decimal,
    quantity: i32,
    is_available: bool,
    created_on: DateTime<Utc>,
}

impl From<CartLineRow> for CartItem {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_image: row.product_image,
            unit_price: row.unit_price,
            quantity: row.quantity,
            is_available: row.is_available,
            created_on: row.created_on,
        }
    }
}

const RECORD_COLUMNS: &str =
    "id, customer_id, product_id, quantity, created_on, latest_updated_on";

/// PostgreSQL implementation of the CartRepository trait
pub struct PgCartRepository {
    db: Database,
}

impl PgCartRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    #[instrument(skip(self))]
    async fn find_cart(&self, customer_id: i64) -> RepositoryResult<Cart> {
        self.db
            .trace("select_cart", "cart_items", async {
                let rows = sqlx::query_as::<_, CartLineRow>(
                    r#"
                    SELECT c.id, c.product_id, p.name AS product_name,
                           p.thumbnail_image_url AS product_image, p.price AS unit_price,
                           c.quantity, (p.is_published AND NOT p.is_deleted) AS is_available,
                           c.created_on
                    FROM cart_items c
                    JOIN products p ON p.id = c.product_id
                    WHERE c.customer_id = $1
                    ORDER BY c.created_on, c.id
                    "#,
                )
                .bind(customer_id)
                .fetch_all(self.db.pool())
                .await?;

                Ok(Cart {
                    customer_id,
                    items: rows.into_iter().map(CartItem::from).collect(),
                })
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_item(
        &self,
        customer_id: i64,
        item_id: i64,
    ) -> RepositoryResult<Option<CartItemRecord>> {
        self.db
            .trace("select", "cart_items", async {
                let row = sqlx::query_as::<_, CartItemRecordRow>(&format!(
                    "SELECT {} FROM cart_items WHERE id = $1 AND customer_id = $2",
                    RECORD_COLUMNS
                ))
                .bind(item_id)
                .bind(customer_id)
                .fetch_optional(self.db.pool())
                .await?;
                Ok(row.map(CartItemRecord::from))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> RepositoryResult<CartItemRecord> {
        self.db
            .trace("upsert", "cart_items", async {
                let row = sqlx::query_as::<_, CartItemRecordRow>(&format!(
                    r#"
                    INSERT INTO cart_items (customer_id, product_id, quantity, created_on, latest_updated_on)
                    VALUES ($1, $2, $3, NOW(), NOW())
                    ON CONFLICT (customer_id, product_id)
                    DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                                  latest_updated_on = NOW()
                    RETURNING {}
                    "#,
                    RECORD_COLUMNS
                ))
                .bind(customer_id)
                .bind(product_id)
                .bind(quantity)
                .fetch_one(self.db.pool())
                .await?;
                Ok(CartItemRecord::from(row))
            })
            .await
    }

    #[instrument(skip(self))]
    async fn update_quantity(&self, item_id: i64, quantity: i32) -> RepositoryResult<()> {
        self.db
            .trace("update", "cart_items", async {
                let result = sqlx::query(
                    "UPDATE cart_items SET quantity = $2, latest_updated_on = NOW() WHERE id = $1",
                )
                .bind(item_id)
                .bind(quantity)
                .execute(self.db.pool())
                .await?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, customer_id: i64, item_id: i64) -> RepositoryResult<bool> {
        self.db
            .trace("delete", "cart_items", async {
                let result =
                    sqlx::query("DELETE FROM cart_items WHERE id = $1 AND customer_id = $2")
                        .bind(item_id)
                        .bind(customer_id)
                        .execute(self.db.pool())
                        .await?;
                Ok(result.rows_affected() > 0)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn clear(&self, customer_id: i64) -> RepositoryResult<u64> {
        self.db
            .trace("delete_all", "cart_items", async {
                let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1")
                    .bind(customer_id)
                    .execute(self.db.pool())
                    .await?;
                Ok(result.rows_affected())
            })
            .await
    }
}
