use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AddressType, Role};

/// Registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub user_guid: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub culture: Option<String>,
    pub roles: Vec<Role>,
    pub default_shipping_address_id: Option<i64>,
    pub default_billing_address_id: Option<i64>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// Whether `token` matches the stored reset token and has not expired
    pub fn reset_token_matches(&self, token: &str, now: DateTime<Utc>) -> bool {
        match (&self.password_reset_token, self.password_reset_expires) {
            (Some(stored), Some(expires)) => stored == token && expires > now,
            _ => false,
        }
    }
}

/// Unsaved account
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub culture: Option<String>,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub full_name: String,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub user_id: i64,
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFullNameRequest {
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullNameChanged {
    pub success: bool,
    pub message: String,
    pub full_name: String,
}

/// Stored postal address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub contact_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub district_id: Option<i64>,
    pub state_or_province_id: i64,
    pub country_id: String,
}

/// Address as entered by a shopper, also used as the order snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub contact_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub district_id: Option<i64>,
    pub state_or_province_id: i64,
    pub country_id: String,
}

impl From<Address> for AddressForm {
    fn from(address: Address) -> Self {
        Self {
            contact_name: address.contact_name,
            phone: address.phone,
            address_line1: address.address_line1,
            address_line2: address.address_line2,
            city: address.city,
            zip_code: address.zip_code,
            district_id: address.district_id,
            state_or_province_id: address.state_or_province_id,
            country_id: address.country_id,
        }
    }
}

/// Address attached to a user's address book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddress {
    pub id: i64,
    pub user_id: i64,
    pub address_type: AddressType,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddressBookResponse {
    pub new_shipping_address: Option<AddressForm>,
    pub new_billing_address: Option<AddressForm>,
    pub existing_shipping_address_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SaveAddressesRequest {
    #[serde(default)]
    pub shipping_address: Option<AddressForm>,
    #[serde(default)]
    pub billing_address: Option<AddressForm>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAddressesResponse {
    pub success: bool,
    pub message: String,
    pub shipping_address_id: Option<i64>,
    pub billing_address_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: String,
    pub name: String,
    pub is_shipping_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateOrProvince {
    pub id: i64,
    pub country_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub id: i64,
    pub state_or_province_id: i64,
    pub name: String,
}

/// `{value, text}` pair for select boxes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictOption {
    pub id: i64,
    pub name: String,
}

impl From<StateOrProvince> for SelectOption {
    fn from(state: StateOrProvince) -> Self {
        Self {
            value: state.id.to_string(),
            text: state.name,
        }
    }
}

impl From<District> for DistrictOption {
    fn from(district: District) -> Self {
        Self {
            id: district.id,
            name: district.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User {
            id: 1,
            user_guid: Uuid::new_v4(),
            email: "shopper@example.com".to_string(),
            full_name: "Sam Shopper".to_string(),
            password_hash: "hash".to_string(),
            culture: None,
            roles: vec![Role::Customer],
            default_shipping_address_id: None,
            default_billing_address_id: None,
            refresh_token: None,
            password_reset_token: Some("abc".to_string()),
            password_reset_expires: Some(Utc::now() + Duration::minutes(30)),
            created_on: Utc::now(),
        }
    }

    #[test]
    fn test_reset_token_matching() {
        let now = Utc::now();
        let user = user();

        assert!(user.reset_token_matches("abc", now));
        assert!(!user.reset_token_matches("abd", now));
        assert!(!user.reset_token_matches("abc", now + Duration::hours(1)));
    }

    #[test]
    fn test_sensitive_fields_not_serialized() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_reset_token").is_none());
        assert!(!user().is_admin());
    }
}
