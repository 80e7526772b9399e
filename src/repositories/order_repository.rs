use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use super::Database;
use crate::models::{
    AddressForm, NewOrder, Order, OrderItem, OrderStatus, RepositoryError, RepositoryResult,
};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Place an order for a checkout.
    ///
    /// Stock is reserved, the order and its lines are written, the checkout is
    /// marked completed and the customer's cart is emptied, all in one
    /// transaction. Insufficient stock or an already completed checkout fails
    /// with a constraint violation and leaves everything untouched.
    async fn create_from_checkout(&self, order: NewOrder) -> RepositoryResult<Order>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>>;

    /// Orders of a customer, newest first
    async fn find_by_customer(&self, customer_id: i64) -> RepositoryResult<Vec<Order>>;
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: i64,
    checkout_id: Option<Uuid>,
    status: String,
    shipping_address: Option<Json<AddressForm>>,
    billing_address: Option<Json<AddressForm>>,
    shipping_method: Option<String>,
    payment_method: String,
    payment_fee_amount: Decimal,
    sub_total: Decimal,
    discount_amount: Decimal,
    tax_amount: Decimal,
    shipping_fee_amount: Decimal,
    order_total: Decimal,
    coupon_code: Option<String>,
    order_note: Option<String>,
    created_on: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> RepositoryResult<Order> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|message| RepositoryError::DataCorruption { message })?;

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            checkout_id: self.checkout_id,
            status,
            shipping_address: self.shipping_address.map(|Json(a)| a),
            billing_address: self.billing_address.map(|Json(a)| a),
            shipping_method: self.shipping_method,
            payment_method: self.payment_method,
            payment_fee_amount: self.payment_fee_amount,
            sub_total: self.sub_total,
            discount_amount: self.discount_amount,
            tax_amount: self.tax_amount,
            shipping_fee_amount: self.shipping_fee_amount,
            order_total: self.order_total,
            coupon_code: self.coupon_code,
            order_note: self.order_note,
            created_on: self.created_on,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    product_name: String,
    product_price: Decimal,
    quantity: i32,
    discount_amount: Decimal,
    tax_amount: Decimal,
    tax_percent: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_price: row.product_price,
            quantity: row.quantity,
            discount_amount: row.discount_amount,
            tax_amount: row.tax_amount,
            tax_percent: row.tax_percent,
        }
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, checkout_id, status, shipping_address, \
     billing_address, shipping_method, payment_method, payment_fee_amount, sub_total, \
     discount_amount, tax_amount, shipping_fee_amount, order_total, coupon_code, order_note, \
     created_on";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, product_price, \
     quantity, discount_amount, tax_amount, tax_percent";

pub struct PgOrderRepository {
    db: Database,
}

impl PgOrderRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn load_items(&self, order_ids: &[i64]) -> RepositoryResult<HashMap<i64, Vec<OrderItem>>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY id",
            ORDER_ITEM_COLUMNS
        ))
        .bind(order_ids)
        .fetch_all(self.db.pool())
        .await?;

        let mut items: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            items.entry(row.order_id).or_default().push(OrderItem::from(row));
        }
        Ok(items)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    #[instrument(skip(self, order), fields(checkout_id = %order.checkout_id, customer_id = order.customer_id))]
    async fn create_from_checkout(&self, order: NewOrder) -> RepositoryResult<Order> {
        self.db
            .trace("insert", "orders", async {
                let mut tx = self.db.pool().begin().await?;

                for item in &order.items {
                    let reserved = sqlx::query(
                        "UPDATE products SET stock_quantity = stock_quantity - $2 \
                         WHERE id = $1 AND stock_quantity >= $2",
                    )
                    .bind(item.product_id)
                    .bind(item.quantity)
                    .execute(&mut *tx)
                    .await?;
                    if reserved.rows_affected() == 0 {
                        return Err(RepositoryError::ConstraintViolation {
                            message: format!(
                                "insufficient stock for product {}",
                                item.product_id
                            ),
                        });
                    }
                }

                let row = sqlx::query_as::<_, OrderRow>(&format!(
                    r#"
                    INSERT INTO orders (
                        customer_id, checkout_id, status, shipping_address, billing_address,
                        shipping_method, payment_method, payment_fee_amount, sub_total,
                        discount_amount, tax_amount, shipping_fee_amount, order_total,
                        coupon_code, order_note, created_on
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW())
                    RETURNING {}
                    "#,
                    ORDER_COLUMNS
                ))
                .bind(order.customer_id)
                .bind(order.checkout_id)
                .bind(order.status.to_string())
                .bind(Json(&order.shipping_address))
                .bind(Json(&order.billing_address))
                .bind(&order.shipping_method)
                .bind(&order.payment_method)
                .bind(order.payment_fee_amount)
                .bind(order.sub_total)
                .bind(order.discount_amount)
                .bind(order.tax_amount)
                .bind(order.shipping_fee_amount)
                .bind(order.order_total)
                .bind(&order.coupon_code)
                .bind(&order.order_note)
                .fetch_one(&mut *tx)
                .await?;

                let mut items = Vec::with_capacity(order.items.len());
                for item in &order.items {
                    let item_row = sqlx::query_as::<_, OrderItemRow>(&format!(
                        r#"
                        INSERT INTO order_items (
                            order_id, product_id, product_name, product_price, quantity,
                            discount_amount, tax_amount, tax_percent
                        )
                        VALUES ($1, $2, $3, $4, $5, 0, $6, $7)
                        RETURNING {}
                        "#,
                        ORDER_ITEM_COLUMNS
                    ))
                    .bind(row.id)
                    .bind(item.product_id)
                    .bind(&item.product_name)
                    .bind(item.product_price)
                    .bind(item.quantity)
                    .bind(item.tax_amount)
                    .bind(item.tax_percent)
                    .fetch_one(&mut *tx)
                    .await?;
                    items.push(OrderItem::from(item_row));
                }

                let completed = sqlx::query(
                    "UPDATE checkouts SET is_completed = TRUE, latest_updated_on = NOW() \
                     WHERE id = $1 AND is_completed = FALSE",
                )
                .bind(order.checkout_id)
                .execute(&mut *tx)
                .await?;
                if completed.rows_affected() == 0 {
                    return Err(RepositoryError::ConstraintViolation {
                        message: format!("checkout {} is already completed", order.checkout_id),
                    });
                }

                sqlx::query("DELETE FROM cart_items WHERE customer_id = $1")
                    .bind(order.customer_id)
                    .execute(&mut *tx)
                    .await?;

                tx.commit().await?;

                row.into_order(items)
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>> {
        self.db
            .trace("select", "orders", async {
                let row = sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {} FROM orders WHERE id = $1",
                    ORDER_COLUMNS
                ))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;

                match row {
                    Some(row) => {
                        let mut items = self.load_items(&[row.id]).await?;
                        let lines = items.remove(&row.id).unwrap_or_default();
                        Ok(Some(row.into_order(lines)?))
                    }
                    None => Ok(None),
                }
            })
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_customer(&self, customer_id: i64) -> RepositoryResult<Vec<Order>> {
        self.db
            .trace("select_by_customer", "orders", async {
                let rows = sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {} FROM orders WHERE customer_id = $1 ORDER BY created_on DESC, id DESC",
                    ORDER_COLUMNS
                ))
                .bind(customer_id)
                .fetch_all(self.db.pool())
                .await?;

                let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
                let mut items = self.load_items(&ids).await?;

                rows.into_iter()
                    .map(|row| {
                        let lines = items.remove(&row.id).unwrap_or_default();
                        row.into_order(lines)
                    })
                    .collect()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(status: &str) -> OrderRow {
        OrderRow {
            id: 1,
            customer_id: 2,
            checkout_id: None,
            status: status.to_string(),
            shipping_address: None,
            billing_address: None,
            shipping_method: Some("Standard".to_string()),
            payment_method: "CashOnDelivery".to_string(),
            payment_fee_amount: dec!(0),
            sub_total: dec!(10),
            discount_amount: dec!(0),
            tax_amount: dec!(1),
            shipping_fee_amount: dec!(0),
            order_total: dec!(11),
            coupon_code: None,
            order_note: None,
            created_on: Utc::now(),
        }
    }

    #[test]
    fn test_order_row_parses_status() {
        let order = row("PendingPayment").into_order(Vec::new()).unwrap();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.order_total, dec!(11));
    }

    #[test]
    fn test_unknown_status_is_data_corruption() {
        let result = row("Teleported").into_order(Vec::new());
        assert!(matches!(result, Err(RepositoryError::DataCorruption { .. })));
    }
}
