use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const COD_PROVIDER_ID: &str = "CoD";
pub const COD_PAYMENT_METHOD: &str = "CashOnDelivery";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProvider {
    pub id: String,
    pub name: String,
    pub is_enabled: bool,
    pub landing_view_component_name: String,
    pub additional_settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProviderResponse {
    pub id: String,
    pub name: String,
    pub landing_view_component_name: String,
}

impl From<PaymentProvider> for PaymentProviderResponse {
    fn from(provider: PaymentProvider) -> Self {
        Self {
            id: provider.id,
            name: provider.name,
            landing_view_component_name: provider.landing_view_component_name,
        }
    }
}

/// Cash-on-delivery limits stored in the provider's additional settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct CodSetting {
    #[serde(default)]
    pub min_order_value: Option<Decimal>,
    #[serde(default)]
    pub max_order_value: Option<Decimal>,
    #[serde(default)]
    pub payment_fee: Decimal,
}

impl CodSetting {
    pub fn from_provider(provider: &PaymentProvider) -> Result<Self, serde_json::Error> {
        match &provider.additional_settings {
            Some(value) => serde_json::from_value(value.clone()),
            None => Ok(Self::default()),
        }
    }

    pub fn is_eligible(&self, order_total: Decimal) -> bool {
        self.min_order_value.map_or(true, |min| order_total >= min)
            && self.max_order_value.map_or(true, |max| order_total <= max)
    }

    /// Fee charged on top of the order, `payment_fee` percent of the total
    pub fn fee_for(&self, order_total: Decimal) -> Decimal {
        order_total / Decimal::ONE_HUNDRED * self.payment_fee
    }
}

/// Body of the cash-on-delivery checkout call: a bare id or `{checkoutId}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodCheckoutRequest {
    Id(Uuid),
    Wrapped {
        #[serde(rename = "checkoutId")]
        checkout_id: Uuid,
    },
}

impl CodCheckoutRequest {
    pub fn checkout_id(&self) -> Uuid {
        match self {
            CodCheckoutRequest::Id(id) => *id,
            CodCheckoutRequest::Wrapped { checkout_id } => *checkout_id,
        }
    }
}
