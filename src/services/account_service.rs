use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::{generate_reset_token, hash_password, verify_password, JwtManager};
use crate::models::{
    validate_required_text, AddressBookResponse, AddressForm, AddressType, AuthResponse,
    ChangeFullNameRequest, DistrictOption, ForgotPasswordRequest, FullNameChanged, LoginRequest,
    NewUser, RegisterRequest, RepositoryError, ResetPasswordRequest, Role, SaveAddressesRequest,
    SaveAddressesResponse, SelectOption, ServiceError, ServiceResult, SuccessResponse, User,
    Validate, MAX_NAME_LENGTH,
};
use crate::repositories::{AddressRepository, UserRepository};
use crate::services::notification::{EmailMessage, EmailSender};

/// Account settings that come from configuration
#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub password_reset_lifetime: Duration,
    pub frontend_url: String,
    pub default_culture: String,
}

/// Registration, sign-in, password recovery and the address book
pub struct AccountService {
    user_repository: Arc<dyn UserRepository>,
    address_repository: Arc<dyn AddressRepository>,
    jwt: Arc<JwtManager>,
    email_sender: Arc<dyn EmailSender>,
    settings: AccountSettings,
}

impl AccountService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        address_repository: Arc<dyn AddressRepository>,
        jwt: Arc<JwtManager>,
        email_sender: Arc<dyn EmailSender>,
        settings: AccountSettings,
    ) -> Self {
        Self {
            user_repository,
            address_repository,
            jwt,
            email_sender,
            settings,
        }
    }

    /// Unknown email and wrong password fail the same way
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let user = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?
            .filter(|user| verify_password(&request.password, &user.password_hash));

        let Some(user) = user else {
            crate::warn_with_trace!("Invalid login attempt");
            return Err(ServiceError::InvalidCredentials);
        };

        crate::info_with_trace!(user_id = user.id, "User signed in");
        self.auth_response(&user)
    }

    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        request.validate()?;

        let email = request.email.trim().to_string();
        if self.user_repository.find_by_email(&email).await?.is_some() {
            return Err(duplicate_email(&email));
        }

        let new_user = NewUser {
            email: email.clone(),
            full_name: request.full_name.trim().to_string(),
            password_hash: hash_password(&request.password)?,
            culture: Some(self.settings.default_culture.clone()),
            roles: vec![Role::Customer],
        };

        let user = match self.user_repository.create(new_user).await {
            Ok(user) => user,
            // Lost a race with another registration of the same address
            Err(RepositoryError::ConstraintViolation { .. }) => {
                return Err(duplicate_email(&email))
            }
            Err(e) => return Err(e.into()),
        };

        crate::info_with_trace!(user_id = user.id, "User registered");
        self.auth_response(&user)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: i64) -> ServiceResult<SuccessResponse> {
        self.user_repository
            .update_refresh_token(user_id, None)
            .await?;
        info!("User signed out");
        Ok(SuccessResponse::ok("Logged out successfully"))
    }

    /// Always succeeds so the response does not reveal which emails exist
    #[instrument(skip(self, request))]
    pub async fn forgot_password(
        &self,
        request: ForgotPasswordRequest,
    ) -> ServiceResult<SuccessResponse> {
        let response = SuccessResponse {
            success: true,
            message: None,
        };

        let Some(user) = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?
        else {
            info!("Password reset requested for unknown email");
            return Ok(response);
        };

        let token = generate_reset_token();
        let expires = Utc::now() + self.settings.password_reset_lifetime;
        self.user_repository
            .set_password_reset(user.id, &token, expires)
            .await?;

        let link = format!(
            "{}/reset-password?userId={}&token={}",
            self.settings.frontend_url.trim_end_matches('/'),
            user.id,
            token
        );
        if let Err(e) = self
            .email_sender
            .send(EmailMessage::password_reset(&user.email, &link))
            .await
        {
            warn!(user_id = user.id, error = %e, "Failed to send password reset email");
        }

        crate::info_with_trace!(user_id = user.id, "Password reset token issued");
        Ok(response)
    }

    #[instrument(skip(self, request), fields(user_id = request.user_id))]
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
    ) -> ServiceResult<SuccessResponse> {
        request.validate()?;

        let user = self
            .user_repository
            .find_by_id(request.user_id)
            .await?
            .ok_or_else(|| ServiceError::validation("Invalid password reset request"))?;

        if !user.reset_token_matches(request.token.trim(), Utc::now()) {
            crate::warn_with_trace!("Rejected password reset token");
            return Err(ServiceError::validation("Invalid or expired token"));
        }

        let password_hash = hash_password(&request.new_password)?;
        self.user_repository
            .reset_password(user.id, &password_hash)
            .await?;

        crate::info_with_trace!("Password reset");
        Ok(SuccessResponse::ok("Password reset successfully"))
    }

    #[instrument(skip(self, request))]
    pub async fn change_full_name(
        &self,
        user_id: i64,
        request: ChangeFullNameRequest,
    ) -> ServiceResult<FullNameChanged> {
        validate_required_text("fullName", &request.full_name, MAX_NAME_LENGTH)?;

        if self.user_repository.find_by_id(user_id).await?.is_none() {
            return Err(ServiceError::not_found("User", user_id));
        }

        let full_name = request.full_name.trim().to_string();
        self.user_repository
            .update_full_name(user_id, &full_name)
            .await?;

        Ok(FullNameChanged {
            success: true,
            message: "Full name updated".to_string(),
            full_name,
        })
    }

    /// Default shipping and billing addresses of the user
    #[instrument(skip(self))]
    pub async fn address_book(&self, user_id: i64) -> ServiceResult<AddressBookResponse> {
        let user = self.find_user(user_id).await?;

        let shipping = self
            .default_address(user_id, user.default_shipping_address_id)
            .await?;
        let billing = self
            .default_address(user_id, user.default_billing_address_id)
            .await?;

        Ok(AddressBookResponse {
            new_shipping_address: shipping,
            new_billing_address: billing,
            existing_shipping_address_id: user.default_shipping_address_id,
        })
    }

    /// Update the default address of each given type, or create it
    #[instrument(skip(self, request))]
    pub async fn save_addresses(
        &self,
        user_id: i64,
        request: SaveAddressesRequest,
    ) -> ServiceResult<SaveAddressesResponse> {
        if let Some(form) = &request.shipping_address {
            form.validate()?;
        }
        if let Some(form) = &request.billing_address {
            form.validate()?;
        }

        let user = self.find_user(user_id).await?;

        let shipping_address_id = match &request.shipping_address {
            Some(form) => Some(
                self.upsert_address(
                    user_id,
                    AddressType::Shipping,
                    user.default_shipping_address_id,
                    form,
                )
                .await?,
            ),
            None => user.default_shipping_address_id,
        };
        let billing_address_id = match &request.billing_address {
            Some(form) => Some(
                self.upsert_address(
                    user_id,
                    AddressType::Billing,
                    user.default_billing_address_id,
                    form,
                )
                .await?,
            ),
            None => user.default_billing_address_id,
        };

        crate::info_with_trace!("Address book saved");
        Ok(SaveAddressesResponse {
            success: true,
            message: "Addresses saved".to_string(),
            shipping_address_id,
            billing_address_id,
        })
    }

    #[instrument(skip(self))]
    pub async fn states(&self, country_id: &str) -> ServiceResult<Vec<SelectOption>> {
        let states = self.address_repository.find_states(country_id).await?;
        Ok(states.into_iter().map(SelectOption::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn districts(&self, state_or_province_id: i64) -> ServiceResult<Vec<DistrictOption>> {
        let districts = self
            .address_repository
            .find_districts(state_or_province_id)
            .await?;
        Ok(districts.into_iter().map(DistrictOption::from).collect())
    }

    fn auth_response(&self, user: &User) -> ServiceResult<AuthResponse> {
        Ok(AuthResponse {
            success: true,
            token: self.jwt.generate_token(user)?,
            full_name: user.full_name.clone(),
            id: user.id,
        })
    }

    async fn find_user(&self, user_id: i64) -> ServiceResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))
    }

    async fn default_address(
        &self,
        user_id: i64,
        user_address_id: Option<i64>,
    ) -> ServiceResult<Option<AddressForm>> {
        let Some(id) = user_address_id else {
            return Ok(None);
        };
        let address = self
            .address_repository
            .find_user_address(user_id, id)
            .await?;
        Ok(address.map(|a| AddressForm::from(a.address)))
    }

    async fn upsert_address(
        &self,
        user_id: i64,
        address_type: AddressType,
        default_id: Option<i64>,
        form: &AddressForm,
    ) -> ServiceResult<i64> {
        if let Some(id) = default_id {
            if let Some(existing) = self
                .address_repository
                .find_user_address(user_id, id)
                .await?
            {
                self.address_repository
                    .update_address(existing.address.id, form)
                    .await?;
                return Ok(existing.id);
            }
        }

        let created = self
            .address_repository
            .add_user_address(user_id, address_type, form)
            .await?;
        self.address_repository
            .set_default_address(user_id, address_type, created.id)
            .await?;
        Ok(created.id)
    }
}

fn duplicate_email(email: &str) -> ServiceError {
    ServiceError::conflict(format!("Email '{}' is already registered", email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Country, District, StateOrProvince, UserAddress};
    use crate::services::notification::NotificationError;
    use async_trait::async_trait;
    use chrono::DateTime;
    use mockall::{mock, predicate::eq};
    use uuid::Uuid;

    mock! {
        TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
            async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
            async fn update_refresh_token(&self, id: i64, token: Option<String>) -> Result<(), RepositoryError>;
            async fn set_password_reset(&self, id: i64, token: &str, expires: DateTime<Utc>) -> Result<(), RepositoryError>;
            async fn reset_password(&self, id: i64, password_hash: &str) -> Result<(), RepositoryError>;
            async fn update_full_name(&self, id: i64, full_name: &str) -> Result<(), RepositoryError>;
        }
    }

    mock! {
        TestAddressRepository {}

        #[async_trait]
        impl AddressRepository for TestAddressRepository {
            async fn find_user_addresses(&self, user_id: i64, address_type: AddressType) -> Result<Vec<UserAddress>, RepositoryError>;
            async fn find_user_address(&self, user_id: i64, user_address_id: i64) -> Result<Option<UserAddress>, RepositoryError>;
            async fn add_user_address(&self, user_id: i64, address_type: AddressType, form: &AddressForm) -> Result<UserAddress, RepositoryError>;
            async fn update_address(&self, address_id: i64, form: &AddressForm) -> Result<(), RepositoryError>;
            async fn set_default_address(&self, user_id: i64, address_type: AddressType, user_address_id: i64) -> Result<(), RepositoryError>;
            async fn find_shipping_countries(&self) -> Result<Vec<Country>, RepositoryError>;
            async fn find_states(&self, country_id: &str) -> Result<Vec<StateOrProvince>, RepositoryError>;
            async fn find_districts(&self, state_or_province_id: i64) -> Result<Vec<District>, RepositoryError>;
        }
    }

    mock! {
        TestEmailSender {}

        #[async_trait]
        impl EmailSender for TestEmailSender {
            async fn send(&self, message: EmailMessage) -> Result<(), NotificationError>;
        }
    }

    struct Mocks {
        users: MockTestUserRepository,
        addresses: MockTestAddressRepository,
        email: MockTestEmailSender,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockTestUserRepository::new(),
                addresses: MockTestAddressRepository::new(),
                email: MockTestEmailSender::new(),
            }
        }

        fn service(self) -> AccountService {
            AccountService::new(
                Arc::new(self.users),
                Arc::new(self.addresses),
                Arc::new(JwtManager::new(
                    "an-hs256-test-key-that-is-long-enough".to_string(),
                    "storefront".to_string(),
                    "storefront".to_string(),
                    7200,
                )),
                Arc::new(self.email),
                AccountSettings {
                    password_reset_lifetime: Duration::minutes(60),
                    frontend_url: "https://shop.example.com/".to_string(),
                    default_culture: "en-US".to_string(),
                },
            )
        }
    }

    fn user(id: i64, password: &str) -> User {
        User {
            id,
            user_guid: Uuid::new_v4(),
            email: "shopper@example.com".to_string(),
            full_name: "Sam Shopper".to_string(),
            password_hash: hash_password(password).unwrap(),
            culture: None,
            roles: vec![Role::Customer],
            default_shipping_address_id: None,
            default_billing_address_id: None,
            refresh_token: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_on: Utc::now(),
        }
    }

    fn form(line1: &str) -> AddressForm {
        AddressForm {
            contact_name: "Sam Shopper".to_string(),
            phone: "555-0100".to_string(),
            address_line1: line1.to_string(),
            state_or_province_id: 1,
            country_id: "US".to_string(),
            ..Default::default()
        }
    }

    fn user_address(id: i64, address_id: i64, address_type: AddressType) -> UserAddress {
        UserAddress {
            id,
            user_id: 1,
            address_type,
            address: Address {
                id: address_id,
                contact_name: "Sam Shopper".to_string(),
                phone: "555-0100".to_string(),
                address_line1: "9 Elm St".to_string(),
                address_line2: None,
                city: None,
                zip_code: None,
                district_id: None,
                state_or_province_id: 1,
                country_id: "US".to_string(),
            },
        }
    }

    fn login(password: &str) -> LoginRequest {
        LoginRequest {
            email: "shopper@example.com".to_string(),
            password: password.to_string(),
            remember_me: false,
        }
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(1, "secret1"))));

        let result = mocks.service().login(login("secret2")).await;
        assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_with_unknown_email() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(|_| Ok(None));

        let result = mocks.service().login(login("secret1")).await;
        assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .with(eq("shopper@example.com".to_string()))
            .returning(|_| Ok(Some(user(1, "secret1"))));

        let response = mocks.service().login(login("secret1")).await.unwrap();
        assert!(response.success);
        assert_eq!(response.id, 1);
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(1, "secret1"))));
        mocks.users.expect_create().never();

        let result = mocks
            .service()
            .register(RegisterRequest {
                email: "shopper@example.com".to_string(),
                password: "secret1".to_string(),
                confirm_password: None,
                full_name: "Sam Shopper".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_register_creates_customer() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(|_| Ok(None));
        mocks
            .users
            .expect_create()
            .withf(|new_user| {
                new_user.roles == vec![Role::Customer]
                    && new_user.culture.as_deref() == Some("en-US")
                    && verify_password("secret1", &new_user.password_hash)
            })
            .times(1)
            .returning(|_| Ok(user(12, "secret1")));

        let response = mocks
            .service()
            .register(RegisterRequest {
                email: "shopper@example.com".to_string(),
                password: "secret1".to_string(),
                confirm_password: Some("secret1".to_string()),
                full_name: "Sam Shopper".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.id, 12);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let result = Mocks::new()
            .service()
            .register(RegisterRequest {
                email: "nope".to_string(),
                password: "secret1".to_string(),
                confirm_password: None,
                full_name: "Sam Shopper".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_forgot_password_for_unknown_email_still_succeeds() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(|_| Ok(None));
        mocks.users.expect_set_password_reset().never();
        mocks.email.expect_send().never();

        let response = mocks
            .service()
            .forgot_password(ForgotPasswordRequest {
                email: "ghost@example.com".to_string(),
            })
            .await
            .unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_forgot_password_sends_reset_link() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(4, "secret1"))));
        mocks
            .users
            .expect_set_password_reset()
            .withf(|id, token, expires| *id == 4 && token.len() == 64 && *expires > Utc::now())
            .times(1)
            .returning(|_, _, _| Ok(()));
        mocks
            .email
            .expect_send()
            .withf(|message| {
                message.to == "shopper@example.com"
                    && message
                        .body
                        .contains("https://shop.example.com/reset-password?userId=4&token=")
            })
            .times(1)
            .returning(|_| Ok(()));

        let response = mocks
            .service()
            .forgot_password(ForgotPasswordRequest {
                email: "shopper@example.com".to_string(),
            })
            .await
            .unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_reset_password_with_wrong_token() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().returning(|id| {
            let mut user = user(id, "secret1");
            user.password_reset_token = Some("expected".to_string());
            user.password_reset_expires = Some(Utc::now() + Duration::minutes(10));
            Ok(Some(user))
        });
        mocks.users.expect_reset_password().never();

        let result = mocks
            .service()
            .reset_password(ResetPasswordRequest {
                user_id: 4,
                token: "other".to_string(),
                new_password: "secret9".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_reset_password_for_unknown_user() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().returning(|_| Ok(None));

        let result = mocks
            .service()
            .reset_password(ResetPasswordRequest {
                user_id: 4,
                token: "expected".to_string(),
                new_password: "secret9".to_string(),
            })
            .await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_reset_password() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().returning(|id| {
            let mut user = user(id, "secret1");
            user.password_reset_token = Some("expected".to_string());
            user.password_reset_expires = Some(Utc::now() + Duration::minutes(10));
            Ok(Some(user))
        });
        mocks
            .users
            .expect_reset_password()
            .withf(|id, hash| *id == 4 && verify_password("secret9", hash))
            .times(1)
            .returning(|_, _| Ok(()));

        let response = mocks
            .service()
            .reset_password(ResetPasswordRequest {
                user_id: 4,
                token: "expected".to_string(),
                new_password: "secret9".to_string(),
            })
            .await
            .unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_change_full_name_rejects_blank() {
        let result = Mocks::new()
            .service()
            .change_full_name(
                1,
                ChangeFullNameRequest {
                    full_name: "   ".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::ValidationError { .. })));
    }

    #[tokio::test]
    async fn test_change_full_name_for_unknown_user() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().returning(|_| Ok(None));

        let result = mocks
            .service()
            .change_full_name(
                1,
                ChangeFullNameRequest {
                    full_name: "Alex".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_logout_clears_refresh_token() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_update_refresh_token()
            .withf(|id, token| *id == 3 && token.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        assert!(mocks.service().logout(3).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_save_addresses_updates_default_and_creates_missing() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().returning(|id| {
            let mut user = user(id, "secret1");
            user.default_shipping_address_id = Some(8);
            Ok(Some(user))
        });
        mocks
            .addresses
            .expect_find_user_address()
            .with(eq(1), eq(8))
            .returning(|_, id| Ok(Some(user_address(id, 80, AddressType::Shipping))));
        mocks
            .addresses
            .expect_update_address()
            .withf(|address_id, form| *address_id == 80 && form.address_line1 == "2 Oak Ave")
            .times(1)
            .returning(|_, _| Ok(()));
        mocks
            .addresses
            .expect_add_user_address()
            .withf(|_, address_type, _| *address_type == AddressType::Billing)
            .times(1)
            .returning(|_, address_type, _| Ok(user_address(9, 90, address_type)));
        mocks
            .addresses
            .expect_set_default_address()
            .with(eq(1), eq(AddressType::Billing), eq(9))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let response = mocks
            .service()
            .save_addresses(
                1,
                SaveAddressesRequest {
                    shipping_address: Some(form("2 Oak Ave")),
                    billing_address: Some(form("3 Pine Rd")),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.shipping_address_id, Some(8));
        assert_eq!(response.billing_address_id, Some(9));
    }

    #[tokio::test]
    async fn test_address_book_reads_defaults() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_id().returning(|id| {
            let mut user = user(id, "secret1");
            user.default_shipping_address_id = Some(8);
            Ok(Some(user))
        });
        mocks
            .addresses
            .expect_find_user_address()
            .returning(|_, id| Ok(Some(user_address(id, 80, AddressType::Shipping))));

        let book = mocks.service().address_book(1).await.unwrap();
        assert_eq!(book.existing_shipping_address_id, Some(8));
        assert_eq!(
            book.new_shipping_address.map(|a| a.address_line1),
            Some("9 Elm St".to_string())
        );
        assert!(book.new_billing_address.is_none());
    }

    #[tokio::test]
    async fn test_states_as_select_options() {
        let mut mocks = Mocks::new();
        mocks
            .addresses
            .expect_find_states()
            .with(eq("US".to_string()))
            .returning(|country_id| {
                Ok(vec![StateOrProvince {
                    id: 5,
                    country_id: country_id.to_string(),
                    name: "Oregon".to_string(),
                }])
            });

        let states = mocks.service().states("US").await.unwrap();
        assert_eq!(
            states,
            vec![SelectOption {
                value: "5".to_string(),
                text: "Oregon".to_string(),
            }]
        );
    }
}
