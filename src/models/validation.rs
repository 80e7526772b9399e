use super::{
    AddCartItemRequest, AddWishListItemRequest, AddressForm, CategoryForm, CreateMenuRequest,
    CreateTagRequest, MenuItemInput, RegisterRequest, ResetPasswordRequest,
    UpdateCartItemRequest, UpdateMenuRequest, ValidationError, ValidationResult,
};

/// Trait for validating input models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_NAME_LENGTH: usize = 450;
pub const MAX_SLUG_LENGTH: usize = 450;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_CODE_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 256;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 100;
pub const MAX_PHONE_LENGTH: usize = 50;
pub const MAX_CART_QUANTITY: i32 = 100;
pub const MIN_CART_QUANTITY: i32 = 1;

impl Validate for CategoryForm {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_text("name", &self.name, MAX_NAME_LENGTH)?;
        validate_slug(&self.slug)?;
        if let Some(parent_id) = self.parent_id {
            validate_positive_id("parentId", parent_id)?;
        }
        Ok(())
    }
}

impl Validate for AddCartItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive_id("productId", self.product_id)?;
        validate_cart_quantity(self.quantity)?;
        Ok(())
    }
}

impl Validate for UpdateCartItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_cart_quantity(self.quantity)
    }
}

impl Validate for AddWishListItemRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive_id("productId", self.product_id)?;
        validate_cart_quantity(self.quantity)?;
        Ok(())
    }
}

impl Validate for CreateTagRequest {
    fn validate(&self) -> ValidationResult<()> {
        let title_en = self.title_en.as_deref().unwrap_or("");
        validate_required_text("titleEn", title_en, MAX_TITLE_LENGTH)?;
        if let Some(title_ar) = &self.title_ar {
            validate_max_length("titleAr", title_ar, MAX_TITLE_LENGTH)?;
        }
        Ok(())
    }
}

impl Validate for MenuItemInput {
    fn validate(&self) -> ValidationResult<()> {
        if self.is_deleted {
            return Ok(());
        }
        validate_required_text("items.titleEn", &self.title_en, MAX_TITLE_LENGTH)?;
        if let Some(title_ar) = &self.title_ar {
            validate_max_length("items.titleAr", title_ar, MAX_TITLE_LENGTH)?;
        }
        validate_positive_id("items.menuItemTypeId", self.menu_item_type_id)?;
        Ok(())
    }
}

impl Validate for CreateMenuRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_text("name", &self.name, MAX_NAME_LENGTH)?;
        validate_required_text("code", &self.code, MAX_CODE_LENGTH)?;
        validate_positive_id("menuTypeId", self.menu_type_id)?;
        self.items.iter().try_for_each(Validate::validate)
    }
}

impl Validate for UpdateMenuRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_text("name", &self.name, MAX_NAME_LENGTH)?;
        self.items.iter().try_for_each(Validate::validate)
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_email(&self.email)?;
        validate_required_text("fullName", &self.full_name, MAX_NAME_LENGTH)?;
        validate_password(&self.password)?;
        if let Some(confirm) = &self.confirm_password {
            if confirm != &self.password {
                return Err(ValidationError::InvalidValue {
                    field: "confirmPassword".to_string(),
                    value: "***".to_string(),
                    reason: "Passwords do not match".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> ValidationResult<()> {
        validate_positive_id("userId", self.user_id)?;
        if self.token.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: "token".to_string(),
            });
        }
        validate_password(&self.new_password)
    }
}

impl Validate for AddressForm {
    fn validate(&self) -> ValidationResult<()> {
        validate_required_text("contactName", &self.contact_name, MAX_NAME_LENGTH)?;
        validate_required_text("phone", &self.phone, MAX_PHONE_LENGTH)?;
        validate_required_text("addressLine1", &self.address_line1, MAX_NAME_LENGTH)?;
        validate_positive_id("stateOrProvinceId", self.state_or_province_id)?;
        if self.country_id.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: "countryId".to_string(),
            });
        }
        Ok(())
    }
}

/// Non-blank text within a length limit
pub fn validate_required_text(field: &str, value: &str, max_length: usize) -> ValidationResult<()> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: field.to_string(),
        });
    }

    validate_max_length(field, trimmed, max_length)?;

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

pub fn validate_max_length(field: &str, value: &str, max_length: usize) -> ValidationResult<()> {
    let length = value.chars().count();
    if length > max_length {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length,
            actual_length: length,
        });
    }
    Ok(())
}

/// Validate URL slug: lowercase letters, digits and single hyphens
pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    validate_required_text("slug", slug, MAX_SLUG_LENGTH)?;
    let trimmed = slug.trim();

    let valid_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid_chars
        || trimmed.starts_with('-')
        || trimmed.ends_with('-')
        || trimmed.contains("--")
    {
        return Err(ValidationError::InvalidFormat {
            field: "slug".to_string(),
            expected: "lowercase letters, digits and single hyphens".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: id.to_string(),
            reason: "Id must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Validate cart item quantity
pub fn validate_cart_quantity(quantity: i32) -> ValidationResult<()> {
    if !(MIN_CART_QUANTITY..=MAX_CART_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_CART_QUANTITY.to_string(),
            max: MAX_CART_QUANTITY.to_string(),
            value: quantity.to_string(),
        });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult<()> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "email".to_string(),
        });
    }

    validate_max_length("email", trimmed, MAX_EMAIL_LENGTH)?;

    let well_formed = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            expected: "name@domain.tld".to_string(),
        });
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min_length: MIN_PASSWORD_LENGTH,
            actual_length: length,
        });
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max_length: MAX_PASSWORD_LENGTH,
            actual_length: length,
        });
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidValue {
            field: "password".to_string(),
            value: "***".to_string(),
            reason: "Password must contain at least one digit".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_text() {
        assert!(validate_required_text("name", "Phones", 10).is_ok());

        assert!(validate_required_text("name", "", 10).is_err());
        assert!(validate_required_text("name", "   ", 10).is_err());
        assert!(validate_required_text("name", &"a".repeat(11), 10).is_err());
        assert!(validate_required_text("name", "Bad\x00Name", 10).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("phones").is_ok());
        assert!(validate_slug("smart-phones-2024").is_ok());

        assert!(validate_slug("").is_err());
        assert!(validate_slug("Phones").is_err());
        assert!(validate_slug("-phones").is_err());
        assert!(validate_slug("smart--phones").is_err());
        assert!(validate_slug("smart phones").is_err());
    }

    #[test]
    fn test_validate_cart_quantity() {
        assert!(validate_cart_quantity(1).is_ok());
        assert!(validate_cart_quantity(MAX_CART_QUANTITY).is_ok());

        assert!(validate_cart_quantity(0).is_err());
        assert!(validate_cart_quantity(-3).is_err());
        assert!(validate_cart_quantity(MAX_CART_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("shopper@example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("shopper").is_err());
        assert!(validate_email("shopper@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("sho pper@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());

        assert!(validate_password("abc1").is_err());
        assert!(validate_password("secretpassword").is_err());
    }

    #[test]
    fn test_category_form_validation() {
        let valid = CategoryForm {
            name: "Phones".to_string(),
            slug: "phones".to_string(),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let invalid = CategoryForm {
            parent_id: Some(0),
            ..valid.clone()
        };
        assert!(invalid.validate().is_err());

        let invalid = CategoryForm {
            slug: "Bad Slug".to_string(),
            ..valid
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "new@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: Some("secret1".to_string()),
            full_name: "New Shopper".to_string(),
        };
        assert!(valid.validate().is_ok());

        let mismatch = RegisterRequest {
            confirm_password: Some("secret2".to_string()),
            ..valid
        };
        assert!(mismatch.validate().is_err());
    }

    #[test]
    fn test_tag_and_address_validation() {
        assert!(CreateTagRequest::default().validate().is_err());
        assert!(CreateTagRequest {
            title_en: Some("Sale".to_string()),
            title_ar: None,
        }
        .validate()
        .is_ok());

        let address = AddressForm {
            contact_name: "Sam".to_string(),
            phone: "555-0100".to_string(),
            address_line1: "1 Main St".to_string(),
            state_or_province_id: 3,
            country_id: "US".to_string(),
            ..Default::default()
        };
        assert!(address.validate().is_ok());
        assert!(AddressForm {
            state_or_province_id: 0,
            ..address
        }
        .validate()
        .is_err());
    }
}
