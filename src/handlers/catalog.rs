use axum::{
    extract::{FromRef, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::error::{service_error_to_response, HandlerError};
use super::extract::ValidJson;
use crate::auth::{AuthUser, JwtManager};
use crate::models::{
    CategoryDetail, CategoryForm, CategoryListItem, CategoryPageResponse, CategorySlugQuery,
    ProductListingParams, ProductListingResponse, UpdateProductCategoryRequest,
};
use crate::services::CategoryService;

#[derive(Clone)]
pub struct CatalogState {
    pub category_service: Arc<CategoryService>,
    pub jwt: Arc<JwtManager>,
}

impl FromRef<CatalogState> for Arc<JwtManager> {
    fn from_ref(state: &CatalogState) -> Self {
        state.jwt.clone()
    }
}

/// Category tree, category pages and the category product listing
pub fn create_catalog_router(category_service: Arc<CategoryService>, jwt: Arc<JwtManager>) -> Router {
    let state = CatalogState {
        category_service,
        jwt,
    };

    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/by-slug", get(get_category_by_slug))
        .route(
            "/api/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/categories/:id/products", get(list_category_products))
        .route(
            "/api/categories/update-product/:id",
            put(update_product_category),
        )
        .with_state(state)
}

#[instrument(name = "list_categories", skip(state))]
pub async fn list_categories(
    State(state): State<CatalogState>,
) -> Result<Json<Vec<CategoryListItem>>, HandlerError> {
    let categories = state
        .category_service
        .list_categories()
        .await
        .map_err(service_error_to_response)?;

    info!("Listed {} categories", categories.len());
    Ok(Json(categories))
}

#[instrument(name = "get_category", skip(state))]
pub async fn get_category(
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryDetail>, HandlerError> {
    state
        .category_service
        .get_category(id)
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "get_category_by_slug", skip(state), fields(slug = query.slug.as_deref()))]
pub async fn get_category_by_slug(
    State(state): State<CatalogState>,
    Query(query): Query<CategorySlugQuery>,
) -> Result<Json<CategoryPageResponse>, HandlerError> {
    state
        .category_service
        .get_category_by_slug(query.slug.as_deref())
        .await
        .map(Json)
        .map_err(service_error_to_response)
}

#[instrument(name = "create_category", skip(state, user, form), fields(user_id = user.user_id))]
pub async fn create_category(
    State(state): State<CatalogState>,
    user: AuthUser,
    ValidJson(form): ValidJson<CategoryForm>,
) -> Result<impl IntoResponse, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    let category = state
        .category_service
        .create_category(form)
        .await
        .map_err(service_error_to_response)?;

    info!(category_id = category.id, "Category created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/categories/{}", category.id))],
        Json(category),
    ))
}

#[instrument(name = "update_category", skip(state, user, form), fields(user_id = user.user_id))]
pub async fn update_category(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(form): ValidJson<CategoryForm>,
) -> Result<impl IntoResponse, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    let category = state
        .category_service
        .update_category(id, form)
        .await
        .map_err(service_error_to_response)?;

    Ok((StatusCode::ACCEPTED, Json(category)))
}

#[instrument(name = "delete_category", skip(state, user), fields(user_id = user.user_id))]
pub async fn delete_category(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .category_service
        .delete_category(id)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "list_category_products", skip(state, params))]
pub async fn list_category_products(
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
    Query(params): Query<ProductListingParams>,
) -> Result<Json<ProductListingResponse>, HandlerError> {
    let listing = state
        .category_service
        .list_products(id, params)
        .await
        .map_err(service_error_to_response)?;

    info!(
        total_items = listing.total_items,
        page = listing.page,
        "Category products listed"
    );
    Ok(Json(listing))
}

#[instrument(name = "update_product_category", skip(state, user, request), fields(user_id = user.user_id))]
pub async fn update_product_category(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<UpdateProductCategoryRequest>,
) -> Result<StatusCode, HandlerError> {
    user.ensure_admin().map_err(service_error_to_response)?;

    state
        .category_service
        .update_product_category(id, request)
        .await
        .map_err(service_error_to_response)?;

    Ok(StatusCode::ACCEPTED)
}
