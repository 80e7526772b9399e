use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AddressForm, Checkout, OrderStatus, OrderTotals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub checkout_id: Option<Uuid>,
    pub status: OrderStatus,
    pub shipping_address: Option<AddressForm>,
    pub billing_address: Option<AddressForm>,
    pub shipping_method: Option<String>,
    pub payment_method: String,
    pub payment_fee_amount: Decimal,
    pub sub_total: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_fee_amount: Decimal,
    pub order_total: Decimal,
    pub coupon_code: Option<String>,
    pub order_note: Option<String>,
    pub created_on: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub tax_percent: Decimal,
}

/// Unsaved order built from a checkout
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub checkout_id: Uuid,
    pub status: OrderStatus,
    pub shipping_address: AddressForm,
    pub billing_address: AddressForm,
    pub shipping_method: String,
    pub payment_method: String,
    pub payment_fee_amount: Decimal,
    pub sub_total: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_fee_amount: Decimal,
    pub order_total: Decimal,
    pub coupon_code: Option<String>,
    pub order_note: Option<String>,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub tax_amount: Decimal,
    pub tax_percent: Decimal,
}

impl NewOrder {
    /// Build an order for a checkout whose delivery step is complete.
    ///
    /// Returns `None` when the checkout carries no shipping data yet.
    pub fn from_checkout(
        checkout: &Checkout,
        totals: OrderTotals,
        tax_percent: Decimal,
        payment_method: &str,
        payment_fee_amount: Decimal,
    ) -> Option<Self> {
        let shipping = checkout.shipping_data.as_ref()?;

        let items = checkout
            .items
            .iter()
            .map(|item| NewOrderItem {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                product_price: item.product_price,
                quantity: item.quantity,
                tax_amount: (item.total() * tax_percent / Decimal::ONE_HUNDRED).round_dp(2),
                tax_percent,
            })
            .collect();

        Some(Self {
            customer_id: checkout.customer_id,
            checkout_id: checkout.id,
            status: OrderStatus::New,
            shipping_address: shipping.shipping_address.clone(),
            billing_address: shipping.billing_address.clone(),
            shipping_method: shipping.shipping_method.clone(),
            payment_method: payment_method.to_string(),
            payment_fee_amount,
            sub_total: totals.sub_total,
            discount_amount: totals.discount,
            tax_amount: totals.tax_amount,
            shipping_fee_amount: totals.shipping_amount,
            order_total: totals.order_total + payment_fee_amount,
            coupon_code: checkout.coupon_code.clone(),
            order_note: shipping.order_note.clone(),
            items,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: i64,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub created_on: DateTime<Utc>,
    pub sub_total: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub payment_fee_amount: Decimal,
    pub order_total: Decimal,
    pub payment_method: String,
    pub shipping_method: Option<String>,
    pub shipping_address: Option<AddressForm>,
    pub order_note: Option<String>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistoryItem {
    pub id: i64,
    pub created_on: DateTime<Utc>,
    pub status: OrderStatus,
    pub sub_total: Decimal,
    pub order_total: Decimal,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResponse {
    pub success: bool,
    pub order_id: i64,
    pub next_step: String,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            product_price: item.product_price,
            quantity: item.quantity,
            tax_amount: item.tax_amount,
            total: item.product_price * Decimal::from(item.quantity) - item.discount_amount,
        }
    }
}

impl From<Order> for OrderDetailResponse {
    fn from(order: Order) -> Self {
        Self {
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            id: order.id,
            customer_id: order.customer_id,
            status: order.status,
            created_on: order.created_on,
            sub_total: order.sub_total,
            discount_amount: order.discount_amount,
            tax_amount: order.tax_amount,
            shipping_amount: order.shipping_fee_amount,
            payment_fee_amount: order.payment_fee_amount,
            order_total: order.order_total,
            payment_method: order.payment_method,
            shipping_method: order.shipping_method,
            shipping_address: order.shipping_address,
            order_note: order.order_note,
        }
    }
}

impl From<Order> for OrderHistoryItem {
    fn from(order: Order) -> Self {
        Self {
            items: order.items.iter().map(OrderItemResponse::from).collect(),
            id: order.id,
            created_on: order.created_on,
            status: order.status,
            sub_total: order.sub_total,
            order_total: order.order_total,
        }
    }
}
