use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AddressForm, AddressType, Country, UserAddress};

/// Snapshot of a cart taken when the shopper starts checking out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkout {
    pub id: Uuid,
    pub customer_id: i64,
    pub created_by_id: i64,
    pub coupon_code: Option<String>,
    pub shipping_method: Option<String>,
    pub shipping_data: Option<ShippingData>,
    pub shipping_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub is_completed: bool,
    pub created_on: DateTime<Utc>,
    pub latest_updated_on: DateTime<Utc>,
    pub items: Vec<CheckoutItem>,
}

/// Checkout line joined with the product's current price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
}

impl CheckoutItem {
    pub fn total(&self) -> Decimal {
        self.product_price * Decimal::from(self.quantity)
    }
}

/// Delivery details stored as JSON on the checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingData {
    pub shipping_address: AddressForm,
    pub billing_address: AddressForm,
    pub shipping_method: String,
    #[serde(default)]
    pub order_note: Option<String>,
}

impl Checkout {
    pub fn new(customer_id: i64, coupon_code: Option<String>, items: Vec<CheckoutItem>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            created_by_id: customer_id,
            coupon_code: coupon_code
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            shipping_method: None,
            shipping_data: None,
            shipping_amount: None,
            tax_amount: None,
            is_completed: false,
            created_on: now,
            latest_updated_on: now,
            items,
        }
    }

    pub fn sub_total(&self) -> Decimal {
        self.items.iter().map(CheckoutItem::total).sum()
    }
}

/// Settings used to price a checkout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingRules {
    pub tax_percent: Decimal,
    pub flat_shipping_fee: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub sub_total: Decimal,
    pub discount: Decimal,
    pub shipping_amount: Decimal,
    pub tax_amount: Decimal,
    pub order_total: Decimal,
}

impl PricingRules {
    pub fn shipping_for(&self, sub_total: Decimal) -> Decimal {
        match self.free_shipping_threshold {
            Some(threshold) if sub_total >= threshold => Decimal::ZERO,
            _ => self.flat_shipping_fee,
        }
    }

    /// Price a checkout. Coupons are recorded but carry no discount.
    pub fn totals(&self, sub_total: Decimal) -> OrderTotals {
        let discount = Decimal::ZERO;
        let taxable = sub_total - discount;
        let shipping_amount = self.shipping_for(sub_total);
        let tax_amount = (taxable * self.tax_percent / Decimal::ONE_HUNDRED).round_dp(2);

        OrderTotals {
            sub_total,
            discount,
            shipping_amount,
            tax_amount,
            order_total: taxable + shipping_amount + tax_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub checkout_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressOption {
    pub user_address_id: i64,
    pub address_type: AddressType,
    pub contact_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub state_or_province_id: i64,
    pub country_id: String,
}

impl From<UserAddress> for AddressOption {
    fn from(user_address: UserAddress) -> Self {
        let address = user_address.address;
        Self {
            user_address_id: user_address.id,
            address_type: user_address.address_type,
            contact_name: address.contact_name,
            phone: address.phone,
            address_line1: address.address_line1,
            address_line2: address.address_line2,
            city: address.city,
            zip_code: address.zip_code,
            state_or_province_id: address.state_or_province_id,
            country_id: address.country_id,
        }
    }
}

/// Delivery form shown on the shipping step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInformation {
    pub checkout_id: Uuid,
    pub existing_shipping_addresses: Vec<AddressOption>,
    pub existing_billing_addresses: Vec<AddressOption>,
    pub shipping_address_id: Option<i64>,
    pub use_shipping_address_as_billing_address: bool,
    pub shippable_countries: Vec<Country>,
}

/// Delivery choices posted on the shipping step
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SaveDeliveryRequest {
    #[serde(default)]
    pub shipping_address_id: Option<i64>,
    #[serde(default)]
    pub new_address_form: Option<AddressForm>,
    #[serde(default = "default_true")]
    pub use_shipping_address_as_billing_address: bool,
    #[serde(default)]
    pub billing_address_id: Option<i64>,
    #[serde(default)]
    pub new_billing_address_form: Option<AddressForm>,
    #[serde(default = "default_shipping_method")]
    pub shipping_method: String,
    #[serde(default)]
    pub order_note: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_shipping_method() -> String {
    "Standard".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStepResponse {
    pub success: bool,
    pub next_step: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResultResponse {
    pub order_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rules() -> PricingRules {
        PricingRules {
            tax_percent: dec!(10),
            flat_shipping_fee: dec!(5),
            free_shipping_threshold: Some(dec!(100)),
        }
    }

    #[test]
    fn test_totals_with_flat_shipping() {
        let totals = rules().totals(dec!(40));

        assert_eq!(totals.shipping_amount, dec!(5));
        assert_eq!(totals.tax_amount, dec!(4.00));
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.order_total, dec!(49.00));
    }

    #[test]
    fn test_totals_with_free_shipping() {
        let totals = rules().totals(dec!(100));
        assert_eq!(totals.shipping_amount, Decimal::ZERO);
        assert_eq!(totals.order_total, dec!(110.00));
    }

    #[test]
    fn test_checkout_sub_total_and_coupon_normalization() {
        let checkout = Checkout::new(
            1,
            Some("  ".to_string()),
            vec![
                CheckoutItem {
                    product_id: 1,
                    product_name: "A".to_string(),
                    product_price: dec!(2.50),
                    quantity: 4,
                },
                CheckoutItem {
                    product_id: 2,
                    product_name: "B".to_string(),
                    product_price: dec!(1.25),
                    quantity: 2,
                },
            ],
        );

        assert_eq!(checkout.sub_total(), dec!(12.50));
        assert_eq!(checkout.coupon_code, None);
        assert!(!checkout.is_completed);
    }
}
