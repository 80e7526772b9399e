use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishList {
    pub id: i64,
    pub user_id: i64,
    pub created_on: DateTime<Utc>,
    pub latest_updated_on: DateTime<Utc>,
}

/// Wishlist entry joined with its product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishListItem {
    pub id: i64,
    pub wish_list_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub created_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWishListItemRequest {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishListItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price: Decimal,
    pub old_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
}

impl From<WishListItem> for WishListItemResponse {
    fn from(item: WishListItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            price: item.price,
            old_price: item.old_price.unwrap_or(Decimal::ZERO),
            product_image: item.product_image,
            quantity: item.quantity,
        }
    }
}
