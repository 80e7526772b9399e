use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle states of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    New,
    OnHold,
    PendingPayment,
    PaymentReceived,
    PaymentFailed,
    Invoiced,
    Shipping,
    Shipped,
    Complete,
    Canceled,
    Refunded,
    Closed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::New => "New",
            OrderStatus::OnHold => "OnHold",
            OrderStatus::PendingPayment => "PendingPayment",
            OrderStatus::PaymentReceived => "PaymentReceived",
            OrderStatus::PaymentFailed => "PaymentFailed",
            OrderStatus::Invoiced => "Invoiced",
            OrderStatus::Shipping => "Shipping",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Complete => "Complete",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::Refunded => "Refunded",
            OrderStatus::Closed => "Closed",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(OrderStatus::New),
            "onhold" => Ok(OrderStatus::OnHold),
            "pendingpayment" => Ok(OrderStatus::PendingPayment),
            "paymentreceived" => Ok(OrderStatus::PaymentReceived),
            "paymentfailed" => Ok(OrderStatus::PaymentFailed),
            "invoiced" => Ok(OrderStatus::Invoiced),
            "shipping" => Ok(OrderStatus::Shipping),
            "shipped" => Ok(OrderStatus::Shipped),
            "complete" => Ok(OrderStatus::Complete),
            "canceled" => Ok(OrderStatus::Canceled),
            "refunded" => Ok(OrderStatus::Refunded),
            "closed" => Ok(OrderStatus::Closed),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}

/// Address book slot a user address occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Shipping,
    Billing,
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressType::Shipping => write!(f, "shipping"),
            AddressType::Billing => write!(f, "billing"),
        }
    }
}

impl FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shipping" => Ok(AddressType::Shipping),
            "billing" => Ok(AddressType::Billing),
            _ => Err(format!("Invalid address type: {}", s)),
        }
    }
}

/// Roles carried in issued tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
    Vendor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Customer => write!(f, "customer"),
            Role::Vendor => write!(f, "vendor"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            "vendor" => Ok(Role::Vendor),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}
