use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{AddCartItemRequest, AddCartItemResponse, CartResponse, UpdateCartItemRequest};
use crate::services::CartService;

/// State for cart handlers
#[derive(Clone)]
pub struct CartHandlerState {
    pub cart_service: Arc<CartService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<CartHandlerState> for Arc<JwtManager> {
    fn from_ref(state: &CartHandlerState) -> Self {
        state.jwt.clone()
    }
}

/// Cart of the caller, plus the customer-scoped aliases used by administrators
pub fn create_cart_router(cart_service: Arc<CartService>, jwt: Arc<JwtManager>) -> Router {
    let state = CartHandlerState { cart_service, jwt };

    Router::new()
        .route("/api/cart", get(get_my_cart).delete(clear_my_cart))
        .route("/api/cart/items", post(add_my_cart_item))
        .route(
            "/api/cart/items/:item_id",
            put(update_my_cart_item).delete(remove_my_cart_item),
        )
        // Path used by existing storefront clients
        .route(
            "/api/carts/items/:item_id",
            put(update_my_cart_item).delete(remove_my_cart_item),
        )
        .route("/api/customers/:customer_id/cart", get(get_customer_cart))
        .route(
            "/api/customers/:customer_id/add-cart-item",
            post(add_customer_cart_item),
        )
        .route(
            "/api/customers/:customer_id/cart-items/:item_id",
            delete(remove_customer_cart_item),
        )
        .with_state(state)
}

#[instrument(name = "get_cart", skip(state, user), fields(user_id = user.user_id))]
pub async fn get_my_cart(
    State(state): State<CartHandlerState>,
    user: AuthUser,
) -> Result<Json<CartResponse>, HandlerError> {
    load_cart(&state, user.user_id).await
}

#[instrument(name = "add_cart_item", skip(state, user), fields(
    user_id = user.user_id,
    product_id = request.product_id,
))]
pub async fn add_my_cart_item(
    State(state): State<CartHandlerState>,
    user: AuthUser,
    ValidJson(request): ValidJson<AddCartItemRequest>,
) -> Result<Json<AddCartItemResponse>, HandlerError> {
    add_item(&state, user.user_id, request).await
}

#[instrument(name = "update_cart_item", skip(state, user), fields(user_id = user.user_id))]
pub async fn update_my_cart_item(
    State(state): State<CartHandlerState>,
    user: AuthUser,
    Path(item_id): Path<i64>,
    ValidJson(request): ValidJson<UpdateCartItemRequest>,
) -> Result<StatusCode, HandlerError> {
    state
        .cart_service
        .update_item(user.user_id, item_id, request)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::ACCEPTED)
}

#[instrument(name = "remove_cart_item", skip(state, user), fields(user_id = user.user_id))]
pub async fn remove_my_cart_item(
    State(state): State<CartHandlerState>,
    user: AuthUser,
    Path(item_id): Path<i64>,
) -> Result<StatusCode, HandlerError> {
    remove_item(&state, user.user_id, item_id).await
}

#[instrument(name = "clear_cart", skip(state, user), fields(user_id = user.user_id))]
pub async fn clear_my_cart(
    State(state): State<CartHandlerState>,
    user: AuthUser,
) -> Result<StatusCode, HandlerError> {
    state
        .cart_service
        .clear_cart(user.user_id)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "get_customer_cart", skip(state, user), fields(user_id = user.user_id))]
pub async fn get_customer_cart(
    State(state): State<CartHandlerState>,
    user: AuthUser,
    Path(customer_id): Path<i64>,
) -> Result<Json<CartResponse>, HandlerError> {
    user.ensure_owner_or_admin(customer_id)
        .map_err(service_error_to_response)?;
    load_cart(&state, customer_id).await
}

#[instrument(name = "add_customer_cart_item", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn add_customer_cart_item(
    State(state): State<CartHandlerState>,
    user: AuthUser,
    Path(customer_id): Path<i64>,
    ValidJson(request): ValidJson<AddCartItemRequest>,
) -> Result<Json<AddCartItemResponse>, HandlerError> {
    user.ensure_owner_or_admin(customer_id)
        .map_err(service_error_to_response)?;
    add_item(&state, customer_id, request).await
}

#[instrument(name = "remove_customer_cart_item", skip(state, user), fields(user_id = user.user_id))]
pub async fn remove_customer_cart_item(
    State(state): State<CartHandlerState>,
    user: AuthUser,
    Path((customer_id, item_id)): Path<(i64, i64)>,
) -> Result<StatusCode, HandlerError> {
    user.ensure_owner_or_admin(customer_id)
        .map_err(service_error_to_response)?;
    remove_item(&state, customer_id, item_id).await
}

async fn load_cart(
    state: &CartHandlerState,
    customer_id: i64,
) -> Result<Json<CartResponse>, HandlerError> {
    let cart = state
        .cart_service
        .get_cart(customer_id)
        .await
        .map_err(service_error_to_response)?;

    info!(
        customer_id,
        item_count = cart.item_count,
        "Cart retrieved"
    );
    Ok(Json(cart))
}

async fn add_item(
    state: &CartHandlerState,
    customer_id: i64,
    request: AddCartItemRequest,
) -> Result<Json<AddCartItemResponse>, HandlerError> {
    let response = state
        .cart_service
        .add_item(customer_id, request)
        .await
        .map_err(service_error_to_response)?;

    crate::info_with_trace!("Added product {} to cart", response.product_id);
    Ok(Json(response))
}

async fn remove_item(
    state: &CartHandlerState,
    customer_id: i64,
    item_id: i64,
) -> Result<StatusCode, HandlerError> {
    state
        .cart_service
        .remove_item(customer_id, item_id)
        .await
        .map_err(service_error_to_response)?;

    crate::info_with_trace!("Removed cart item {}", item_id);
    Ok(StatusCode::NO_CONTENT)
}
