use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{CodCheckoutRequest, OrderCreatedResponse, PaymentProviderResponse};
use crate::services::PaymentService;

#[derive(Clone)]
pub struct PaymentState {
    pub payment_service: Arc<PaymentService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<PaymentState> for Arc<JwtManager> {
    fn from_ref(state: &PaymentState) -> Self {
        state.jwt.clone()
    }
}

pub fn create_payment_router(payment_service: Arc<PaymentService>, jwt: Arc<JwtManager>) -> Router {
    Router::new()
        .route("/api/cod/checkout", post(cod_checkout))
        .route("/api/payments-providers", get(list_payment_providers))
        .route(
            "/api/payments-providers/:provider_id/enable",
            post(enable_payment_provider),
        )
        .route(
            "/api/payments-providers/:provider_id/disable",
            post(disable_payment_provider),
        )
        .with_state(PaymentState {
            payment_service,
            jwt,
        })
}

/// Accepts the checkout id as a bare JSON string or as `{checkoutId}`
#[instrument(name = "cod_checkout", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn cod_checkout(
    State(state): State<PaymentState>,
    user: AuthUser,
    ValidJson(request): ValidJson<CodCheckoutRequest>,
) -> Result<Json<OrderCreatedResponse>, HandlerError> {
    let created = state
        .payment_service
        .cod_checkout(request.checkout_id(), &user)
        .await
        .map_err(service_error_to_response)?;

    info!(order_id = created.order_id, "Cash-on-delivery order placed");
    Ok(Json(created))
}

#[instrument(name = "list_payment_providers", skip(state, _user))]
pub async fn list_payment_providers(
    State(state): State<PaymentState>,
    _user: AuthUser,
) -> Result<Json<Vec<PaymentProviderResponse>>, HandlerError> {
    state
        .payment_service
        .enabled_providers()
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

pub async fn enable_payment_provider(
    State(state): State<PaymentState>,
    user: AuthUser,
    Path(provider_id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    toggle_provider(&state, &user, &provider_id, true).await
}

pub async fn disable_payment_provider(
    State(state): State<PaymentState>,
    user: AuthUser,
    Path(provider_id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    toggle_provider(&state, &user, &provider_id, false).await
}

#[instrument(name = "toggle_payment_provider", skip(state, user), fields(user_id = user.user_id))]
async fn toggle_provider(
    state: &PaymentState,
    user: &AuthUser,
    provider_id: &str,
    is_enabled: bool,
) -> Result<StatusCode, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .payment_service
        .set_enabled(provider_id, is_enabled)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}
