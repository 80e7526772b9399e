use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use super::Database;
use crate::models::{
    Checkout, CheckoutItem, RepositoryError, RepositoryResult, ShippingData,
};

#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    /// Store a checkout together with its lines
    async fn create(&self, checkout: &Checkout) -> RepositoryResult<()>;

    /// Checkout with lines priced at the products' current prices
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Checkout>>;

    async fn save_shipping(
        &self,
        id: Uuid,
        shipping_data: &ShippingData,
    ) -> RepositoryResult<()>;

    async fn update_prices(
        &self,
        id: Uuid,
        shipping_amount: Decimal,
        tax_amount: Decimal,
    ) -> RepositoryResult<()>;
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutRow {
    id: Uuid,
    customer_id: i64,
    created_by_id: i64,
    coupon_code: Option<String>,
    shipping_method: Option<String>,
    shipping_data: Option<Json<ShippingData>>,
    shipping_amount: Option<Decimal>,
    tax_amount: Option<Decimal>,
    is_completed: bool,
    created_on: DateTime<Utc>,
    latest_updated_on: DateTime<Utc>,
}

impl CheckoutRow {
    fn into_checkout(self, items: Vec<CheckoutItem>) -> Checkout {
        Checkout {
            id: self.id,
            customer_id: self.customer_id,
            created_by_id: self.created_by_id,
            coupon_code: self.coupon_code,
            shipping_method: self.shipping_method,
            shipping_data: self.shipping_data.map(|Json(data)| data),
            shipping_amount: self.shipping_amount,
            tax_amount: self.tax_amount,
            is_completed: self.is_completed,
            created_on: self.created_on,
            latest_updated_on: self.latest_updated_on,
            items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CheckoutItemRow {
    product_id: i64,
    product_name: String,
    product_price: Decimal,
    quantity: i32,
}

impl From<CheckoutItemRow> for CheckoutItem {
    fn from(row: CheckoutItemRow) -> Self {
        Self {
            product_id: row.product_id,
            product_name: row.product_name,
            product_price: row.product_price,
            quantity: row.quantity,
        }
    }
}

pub struct PgCheckoutRepository {
    db: Database,
}

impl PgCheckoutRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckoutRepository for PgCheckoutRepository {
    #[instrument(skip(self, checkout), fields(checkout_id = %checkout.id, items = checkout.items.len()))]
    async fn create(&self, checkout: &Checkout) -> RepositoryResult<()> {
        self.db
            .trace("insert", "checkouts", async {
                let mut tx = self.db.pool().begin().await?;

                sqlx::query(
                    r#"
                    INSERT INTO checkouts (
                        id, customer_id, created_by_id, coupon_code, is_completed,
                        created_on, latest_updated_on
                    )
                    VALUES ($1, $2, $3, $4, FALSE, $5, $6)
                    "#,
                )
                .bind(checkout.id)
                .bind(checkout.customer_id)
                .bind(checkout.created_by_id)
                .bind(&checkout.coupon_code)
                .bind(checkout.created_on)
                .bind(checkout.latest_updated_on)
                .execute(&mut *tx)
                .await?;

                for item in &checkout.items {
                    sqlx::query(
                        "INSERT INTO checkout_items (checkout_id, product_id, quantity) \
                         VALUES ($1, $2, $3)",
                    )
                    .bind(checkout.id)
                    .bind(item.product_id)
                    .bind(item.quantity)
                    .execute(&mut *tx)
                    .await?;
                }

                tx.commit().await?;
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Checkout>> {
        self.db
            .trace("select", "checkouts", async {
                let row = sqlx::query_as::<_, CheckoutRow>(
                    r#"
                    SELECT id, customer_id, created_by_id, coupon_code, shipping_method,
                           shipping_data, shipping_amount, tax_amount, is_completed,
                           created_on, latest_updated_on
                    FROM checkouts WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;

                let Some(row) = row else {
                    return Ok(None);
                };

                let items = sqlx::query_as::<_, CheckoutItemRow>(
                    r#"
                    SELECT ci.product_id, p.name AS product_name, p.price AS product_price,
                           ci.quantity
                    FROM checkout_items ci
                    JOIN products p ON p.id = ci.product_id
                    WHERE ci.checkout_id = $1
                    ORDER BY ci.id
                    "#,
                )
                .bind(id)
                .fetch_all(self.db.pool())
                .await?;

                Ok(Some(
                    row.into_checkout(items.into_iter().map(CheckoutItem::from).collect()),
                ))
            })
            .await
    }

    #[instrument(skip(self, shipping_data))]
    async fn save_shipping(
        &self,
        id: Uuid,
        shipping_data: &ShippingData,
    ) -> RepositoryResult<()> {
        self.db
            .trace("update_shipping", "checkouts", async {
                let result = sqlx::query(
                    r#"
                    UPDATE checkouts
                    SET shipping_data = $2, shipping_method = $3, latest_updated_on = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(Json(shipping_data))
                .bind(&shipping_data.shipping_method)
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
    async fn update_prices(
        &self,
        id: Uuid,
        shipping_amount: Decimal,
        tax_amount: Decimal,
    ) -> RepositoryResult<()> {
        self.db
            .trace("update_prices", "checkouts", async {
                let result = sqlx::query(
                    r#"
                    UPDATE checkouts
                    SET shipping_amount = $2, tax_amount = $3, latest_updated_on = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(shipping_amount)
                .bind(tax_amount)
                .execute(self.db.pool())
                .await?;
                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound);
                }
                Ok(())
            })
            .await
    }
}
