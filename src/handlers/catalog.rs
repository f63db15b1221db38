use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::user::Role;
use crate::errors::ServiceError;
use crate::services::catalog::{CreateNamedRequest, CreateSellerRequest};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    fn resolve(&self) -> (u64, u64) {
        (
            self.page.unwrap_or(1).max(1),
            self.limit.unwrap_or(20).clamp(1, 100),
        )
    }
}

pub fn sellers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sellers).post(create_seller))
        .route("/:id", get(get_seller).delete(delete_seller))
}

pub fn categories_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", axum::routing::delete(delete_category))
}

pub fn brands_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/:id", axum::routing::delete(delete_brand))
}

pub async fn create_seller(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateSellerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let seller = state.services.catalog.create_seller(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(seller)))
}

pub async fn get_seller(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let seller = state.services.catalog.get_seller(id).await?;
    Ok(Json(seller))
}

pub async fn list_sellers(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = query.resolve();
    let (data, total_count) = state.services.catalog.list_sellers(page, limit).await?;
    Ok(Json(json!({ "data": data, "total_count": total_count })))
}

/// ADMIN only.
pub async fn delete_seller(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin])?;
    state.services.catalog.delete_seller(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateNamedRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let category = state
        .services
        .catalog
        .create_category(request, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = query.resolve();
    let (data, total_count) = state.services.catalog.list_categories(page, limit).await?;
    Ok(Json(json!({ "data": data, "total_count": total_count })))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin])?;
    state.services.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateNamedRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let brand = state.services.catalog.create_brand(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn list_brands(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = query.resolve();
    let (data, total_count) = state.services.catalog.list_brands(page, limit).await?;
    Ok(Json(json!({ "data": data, "total_count": total_count })))
}

pub async fn delete_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin])?;
    state.services.catalog.delete_brand(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
