use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{AddWishListItemRequest, WishListItemResponse};
use crate::services::WishListService;

#[derive(Clone)]
pub struct WishListState {
    pub wishlist_service: Arc<WishListService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<WishListState> for Arc<JwtManager> {
    fn from_ref(state: &WishListState) -> Self {
        state.jwt.clone()
    }
}

pub fn create_wishlist_router(
    wishlist_service: Arc<WishListService>,
    jwt: Arc<JwtManager>,
) -> Router {
    Router::new()
        .route("/api/wishlist/:user_id", get(get_wishlist))
        .route("/api/wishlist/add-item/:user_id", post(add_wishlist_item))
        .route(
            "/api/wishlist/remove-item/:user_id/:product_id",
            delete(remove_wishlist_item),
        )
        .with_state(WishListState {
            wishlist_service,
            jwt,
        })
}

#[instrument(name = "get_wishlist", skip(state, user), fields(caller_id = user.user_id))]
pub async fn get_wishlist(
    State(state): State<WishListState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<WishListItemResponse>>, HandlerError> {
    user.ensure_owner_or_admin(user_id)
        .map_err(service_error_to_response)?;

    let items = state
        .wishlist_service
        .get_items(user_id)
        .await
        .map_err(service_error_to_response)?;

    info!("Wishlist holds {} items", items.len());
    Ok(Json(items))
}

#[instrument(name = "add_wishlist_item", skip(state, user), fields(
    caller_id = user.user_id,
    product_id = request.product_id,
))]
pub async fn add_wishlist_item(
    State(state): State<WishListState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
    ValidJson(request): ValidJson<AddWishListItemRequest>,
) -> Result<StatusCode, HandlerError> {
    user.ensure_owner_or_admin(user_id)
        .map_err(service_error_to_response)?;

    state
        .wishlist_service
        .add_item(user_id, request)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::OK)
}

#[instrument(name = "remove_wishlist_item", skip(state, user), fields(caller_id = user.user_id))]
pub async fn remove_wishlist_item(
    State(state): State<WishListState>,
    user: AuthUser,
    Path((user_id, product_id)): Path<(i64, i64)>,
) -> Result<StatusCode, HandlerError> {
    user.ensure_owner_or_admin(user_id)
        .map_err(service_error_to_response)?;

    state
        .wishlist_service
        .remove_item(user_id, product_id)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}
