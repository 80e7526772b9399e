use axum::{
    extract::{FromRef, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{
    CheckoutResultResponse, CreateCheckoutRequest, CreateCheckoutResponse, DeliveryInformation,
    DistrictOption, NextStepResponse, OrderTotals, SaveDeliveryRequest,
};
use crate::services::CheckoutService;

#[derive(Clone)]
pub struct CheckoutState {
    pub checkout_service: Arc<CheckoutService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<CheckoutState> for Arc<JwtManager> {
    fn from_ref(state: &CheckoutState) -> Self {
        state.jwt.clone()
    }
}

/// Checkout flow from cart snapshot to the payment step
pub fn create_checkout_router(
    checkout_service: Arc<CheckoutService>,
    jwt: Arc<JwtManager>,
) -> Router {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route(
            "/checkout/:checkout_id/shipping",
            get(get_delivery_information).post(save_delivery_information),
        )
        .route(
            "/checkout/:checkout_id/update-tax-and-shipping-prices",
            post(update_tax_and_shipping_prices),
        )
        .route("/checkout/success/:order_id", get(checkout_success))
        .route("/checkout/error/:order_id", get(checkout_error))
        .route(
            "/checkout/api/states/:state_id/districts",
            get(get_districts),
        )
        .with_state(CheckoutState {
            checkout_service,
            jwt,
        })
}

/// The coupon body is optional, an empty POST starts a checkout too
#[instrument(name = "create_checkout", skip(state, user, body), fields(user_id = user.user_id))]
pub async fn create_checkout(
    State(state): State<CheckoutState>,
    user: AuthUser,
    body: Option<ValidJson<CreateCheckoutRequest>>,
) -> Result<Json<CreateCheckoutResponse>, HandlerError> {
    let request = body.map(|ValidJson(request)| request).unwrap_or_default();

    state
        .checkout_service
        .create_checkout(user.user_id, request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_delivery_information", skip(state, user), fields(user_id = user.user_id))]
pub async fn get_delivery_information(
    State(state): State<CheckoutState>,
    user: AuthUser,
    Path(checkout_id): Path<Uuid>,
) -> Result<Json<DeliveryInformation>, HandlerError> {
    state
        .checkout_service
        .delivery_information(checkout_id, &user)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "save_delivery_information", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn save_delivery_information(
    State(state): State<CheckoutState>,
    user: AuthUser,
    Path(checkout_id): Path<Uuid>,
    ValidJson(request): ValidJson<SaveDeliveryRequest>,
) -> Result<Json<NextStepResponse>, HandlerError> {
    state
        .checkout_service
        .save_delivery_information(checkout_id, &user, request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "update_tax_and_shipping_prices", skip(state, user), fields(user_id = user.user_id))]
pub async fn update_tax_and_shipping_prices(
    State(state): State<CheckoutState>,
    user: AuthUser,
    Path(checkout_id): Path<Uuid>,
) -> Result<Json<OrderTotals>, HandlerError> {
    state
        .checkout_service
        .update_tax_and_shipping(checkout_id, &user)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

pub async fn checkout_success(
    State(state): State<CheckoutState>,
    _user: AuthUser,
    Path(order_id): Path<i64>,
) -> Json<CheckoutResultResponse> {
    Json(state.checkout_service.success(order_id))
}

pub async fn checkout_error(
    State(state): State<CheckoutState>,
    _user: AuthUser,
    Path(order_id): Path<i64>,
) -> Json<CheckoutResultResponse> {
    Json(state.checkout_service.error(order_id))
}

#[instrument(name = "get_checkout_districts", skip(state))]
pub async fn get_districts(
    State(state): State<CheckoutState>,
    Path(state_id): Path<i64>,
) -> Result<Json<Vec<DistrictOption>>, HandlerError> {
    state
        .checkout_service
        .districts(state_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
