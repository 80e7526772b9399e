use axum::{
    extract::{FromRef, Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tracing::instrument;

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{CreateMenuRequest, IdResponse, MenuLookup, UpdateMenuRequest};
use crate::services::MenuService;

#[derive(Clone)]
pub struct MenuState {
    pub menu_service: Arc<MenuService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<MenuState> for Arc<JwtManager> {
    fn from_ref(state: &MenuState) -> Self {
        state.jwt.clone()
    }
}

pub fn create_menu_router(menu_service: Arc<MenuService>, jwt: Arc<JwtManager>) -> Router {
    Router::new()
        .route("/api/menu/type/:menu_type_id", get(get_menu_by_type))
        .route("/api/menu", post(create_menu))
        .route("/api/menu/:menu_id", put(update_menu))
        .with_state(MenuState { menu_service, jwt })
}

/// `-1` answers with every active menu, any other type with its first menu
#[instrument(name = "get_menu_by_type", skip(state))]
pub async fn get_menu_by_type(
    State(state): State<MenuState>,
    Path(menu_type_id): Path<i64>,
) -> Result<Json<MenuLookup>, HandlerError> {
    state
        .menu_service
        .get_by_type(menu_type_id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "create_menu", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn create_menu(
    State(state): State<MenuState>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateMenuRequest>,
) -> Result<Json<IdResponse>, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .menu_service
        .create_menu(request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "update_menu", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn update_menu(
    State(state): State<MenuState>,
    user: AuthUser,
    Path(menu_id): Path<i64>,
    ValidJson(request): ValidJson<UpdateMenuRequest>,
) -> Result<Json<IdResponse>, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .menu_service
        .update_menu(menu_id, request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
