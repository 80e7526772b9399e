use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{
    AddressBookResponse, AuthResponse, ChangeFullNameRequest, DistrictOption,
    ForgotPasswordRequest, FullNameChanged, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SaveAddressesRequest, SaveAddressesResponse, SelectOption, ServiceError, SuccessResponse,
};
use crate::services::AccountService;

#[derive(Clone)]
pub struct AccountState {
    pub account_service: Arc<AccountService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<AccountState> for Arc<JwtManager> {
    fn from_ref(state: &AccountState) -> Self {
        state.jwt.clone()
    }
}

/// Sign in, registration, password recovery and the caller's address book
pub fn create_account_router(account_service: Arc<AccountService>, jwt: Arc<JwtManager>) -> Router {
    Router::new()
        .route("/api/account/login", post(login))
        .route("/api/account/register", post(register))
        .route("/api/account/logout", post(logout))
        .route("/api/account/forgot-password", post(forgot_password))
        .route("/api/account/reset-password", post(reset_password))
        .route("/api/account/change-fullname", post(change_full_name))
        .route("/api/account/addresses", get(get_addresses).post(save_addresses))
        .route(
            "/api/account/countries/:country_id/states-provinces",
            get(get_states_provinces),
        )
        .route(
            "/api/account/states-provinces/:state_id/districts",
            get(get_districts),
        )
        .with_state(AccountState {
            account_service,
            jwt,
        })
}

/// Bad credentials answer with the login form's own body instead of the error envelope
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AccountState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<Json<AuthResponse>, HandlerError> {
    match state.account_service.login(request).await {
        Ok(response) => Ok(Json(response)),
        Err(ServiceError::InvalidCredentials) => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Invalid login attempt",
            })),
        )),
        Err(err) => Err(service_error_to_response(err)),
    }
}

#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AccountState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, HandlerError> {
    state
        .account_service
        .register(request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "logout", skip(state, user), fields(user_id = user.user_id))]
pub async fn logout(
    State(state): State<AccountState>,
    user: AuthUser,
) -> Result<Json<SuccessResponse>, HandlerError> {
    state
        .account_service
        .logout(user.user_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "forgot_password", skip(state, request))]
pub async fn forgot_password(
    State(state): State<AccountState>,
    ValidJson(request): ValidJson<ForgotPasswordRequest>,
) -> Result<Json<SuccessResponse>, HandlerError> {
    state
        .account_service
        .forgot_password(request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "reset_password", skip(state, request), fields(user_id = request.user_id))]
pub async fn reset_password(
    State(state): State<AccountState>,
    ValidJson(request): ValidJson<ResetPasswordRequest>,
) -> Result<Json<SuccessResponse>, HandlerError> {
    state
        .account_service
        .reset_password(request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "change_full_name", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn change_full_name(
    State(state): State<AccountState>,
    user: AuthUser,
    ValidJson(request): ValidJson<ChangeFullNameRequest>,
) -> Result<Json<FullNameChanged>, HandlerError> {
    state
        .account_service
        .change_full_name(user.user_id, request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_addresses", skip(state, user), fields(user_id = user.user_id))]
pub async fn get_addresses(
    State(state): State<AccountState>,
    user: AuthUser,
) -> Result<Json<AddressBookResponse>, HandlerError> {
    state
        .account_service
        .address_book(user.user_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "save_addresses", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn save_addresses(
    State(state): State<AccountState>,
    user: AuthUser,
    ValidJson(request): ValidJson<SaveAddressesRequest>,
) -> Result<Json<SaveAddressesResponse>, HandlerError> {
    state
        .account_service
        .save_addresses(user.user_id, request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_states_provinces", skip(state))]
pub async fn get_states_provinces(
    State(state): State<AccountState>,
    Path(country_id): Path<String>,
) -> Result<Json<Vec<SelectOption>>, HandlerError> {
    state
        .account_service
        .states(&country_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_account_districts", skip(state))]
pub async fn get_districts(
    State(state): State<AccountState>,
    Path(state_id): Path<i64>,
) -> Result<Json<Vec<DistrictOption>>, HandlerError> {
    state
        .account_service
        .districts(state_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
