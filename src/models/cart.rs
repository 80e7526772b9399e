use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer's cart, read as lines joined with their products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: i64,
    pub items: Vec<CartItem>,
}

/// Individual line of a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub is_available: bool,
    pub created_on: DateTime<Utc>,
}

/// Stored cart row without product details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub created_on: DateTime<Utc>,
    pub latest_updated_on: DateTime<Utc>,
}

/// Request model for adding an item to cart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Request model for updating cart item quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemResponse {
    pub success: bool,
    pub item_id: i64,
    pub product_id: i64,
}

/// Response model for cart operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub customer_id: i64,
    pub items: Vec<CartItemResponse>,
    pub sub_total: Decimal,
    pub item_count: i32,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_image: Option<String>,
    pub product_price: Decimal,
    pub quantity: i32,
    pub total: Decimal,
    pub is_available: bool,
}

impl Cart {
    /// Create a new empty cart for a customer
    pub fn new(customer_id: i64) -> Self {
        Self {
            customer_id,
            items: Vec::new(),
        }
    }

    /// Get the total number of units in the cart
    pub fn total_items(&self) -> i32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Get the total price of all items in the cart
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::total_price).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get_item(&self, item_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn contains_product(&self, product_id: i64) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    /// Quantity of a product already in the cart
    pub fn product_quantity(&self, product_id: i64) -> i32 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }

    /// Every line refers to a product that can still be sold
    pub fn all_available(&self) -> bool {
        self.items.iter().all(|item| item.is_available)
    }
}

impl CartItem {
    /// Get the total price for this line (unit_price * quantity)
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        let sub_total = cart.total_price();
        let item_count = cart.total_items();
        let is_valid = cart.all_available();

        Self {
            customer_id: cart.customer_id,
            items: cart
                .items
                .into_iter()
                .map(|item| CartItemResponse {
                    total: item.total_price(),
                    id: item.id,
                    product_id: item.product_id,
                    product_name: item.product_name,
                    product_image: item.product_image,
                    product_price: item.unit_price,
                    quantity: item.quantity,
                    is_available: item.is_available,
                })
                .collect(),
            sub_total,
            item_count,
            is_valid,
        }
    }
}
