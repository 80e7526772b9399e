use axum::{
    extract::{FromRef, Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::instrument;

use super::error::{service_error_to_response, HandlerError};
use crate::auth::{AuthUser, JwtManager};
use crate::models::{OrderDetailResponse, OrderHistoryItem};
use crate::services::OrderService;

#[derive(Clone)]
pub struct OrderState {
    pub order_service: Arc<OrderService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<OrderState> for Arc<JwtManager> {
    fn from_ref(state: &OrderState) -> Self {
        state.jwt.clone()
    }
}

pub fn create_order_router(order_service: Arc<OrderService>, jwt: Arc<JwtManager>) -> Router {
    Router::new()
        .route(
            "/api/customer/orders/order-confirmation/:order_id",
            get(order_confirmation),
        )
        .route("/api/customer/orders/users/:user_id", get(order_history))
        .with_state(OrderState { order_service, jwt })
}

#[instrument(name = "order_confirmation", skip(state, user))]
pub async fn order_confirmation(
    State(state): State<OrderState>,
    user: AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetailResponse>, HandlerError> {
    state
        .order_service
        .order_confirmation(order_id, &user)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "order_history", skip(state, user))]
pub async fn order_history(
    State(state): State<OrderState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OrderHistoryItem>>, HandlerError> {
    state
        .order_service
        .order_history(user_id, &user)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
