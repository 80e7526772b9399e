use axum::{
    extract::{FromRef, Query, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{BannerQuery, BannerResponse, CreateBannerRequest, IdResponse};
use crate::services::BannerService;

#[derive(Clone)]
pub struct BannerState {
    pub banner_service: Arc<BannerService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<BannerState> for Arc<JwtManager> {
    fn from_ref(state: &BannerState) -> Self {
        state.jwt.clone()
    }
}

pub fn create_banner_router(banner_service: Arc<BannerService>, jwt: Arc<JwtManager>) -> Router {
    Router::new()
        .route("/api/banner", get(get_banners).post(create_banner))
        .with_state(BannerState {
            banner_service,
            jwt,
        })
}

/// Live banners for a page and banner type
#[instrument(name = "get_banners", skip(state), fields(
    page_code = query.page_code.as_deref(),
    type_code = query.type_code.as_deref(),
))]
pub async fn get_banners(
    State(state): State<BannerState>,
    Query(query): Query<BannerQuery>,
) -> Result<Json<Vec<BannerResponse>>, HandlerError> {
    let banners = state
        .banner_service
        .get_banners(query)
        .await
        .map_err(service_error_to_response)?;

    info!("Found {} live banners", banners.len());
    Ok(Json(banners))
}

#[instrument(name = "create_banner", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn create_banner(
    State(state): State<BannerState>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateBannerRequest>,
) -> Result<Json<IdResponse>, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .banner_service
        .create_banner(request)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}
