use axum::{
    extract::{FromRef, Path, Query, State},
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
use crate::models::{CreateTagRequest, MessageResponse, ProductSummary, ProductTag, TagMapping};
use crate::services::TagService;

#[derive(Clone)]
pub struct TagState {
    pub tag_service: Arc<TagService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<TagState> for Arc<JwtManager> {
    fn from_ref(state: &TagState) -> Self {
        state.jwt.clone()
    }
}

pub fn create_tag_router(tag_service: Arc<TagService>, jwt: Arc<JwtManager>) -> Router {
    Router::new()
        .route("/api/tag", post(create_tag))
        .route("/api/tag/products/:tag_id", get(products_by_tag))
        .route("/api/tag/mapping", post(add_mapping).delete(remove_mapping))
        .route("/api/tag/:id", delete(delete_tag))
        .with_state(TagState { tag_service, jwt })
}

#[instrument(name = "products_by_tag", skip(state))]
pub async fn products_by_tag(
    State(state): State<TagState>,
    Path(tag_id): Path<i64>,
) -> Result<Json<Vec<ProductSummary>>, HandlerError> {
    let products = state
        .tag_service
        .products_by_tag(tag_id)
        .await
        .map_err(service_error_to_response)?;

    info!("Found {} tagged products", products.len());
    Ok(Json(products))
}

#[instrument(name = "create_tag", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn create_tag(
    State(state): State<TagState>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateTagRequest>,
) -> Result<Json<ProductTag>, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .tag_service
        .create_tag(request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "add_tag_mapping", skip(state, user), fields(user_id = user.user_id))]
pub async fn add_mapping(
    State(state): State<TagState>,
    user: AuthUser,
    ValidJson(mapping): ValidJson<TagMapping>,
) -> Result<Json<TagMapping>, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .tag_service
        .add_mapping(mapping)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "remove_tag_mapping", skip(state, user), fields(user_id = user.user_id))]
pub async fn remove_mapping(
    State(state): State<TagState>,
    user: AuthUser,
    Query(mapping): Query<TagMapping>,
) -> Result<StatusCode, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .tag_service
        .remove_mapping(mapping)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::OK)
}

#[instrument(name = "delete_tag", skip(state, user), fields(user_id = user.user_id))]
pub async fn delete_tag(
    State(state): State<TagState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .tag_service
        .delete_tag(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
