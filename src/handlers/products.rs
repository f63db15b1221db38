use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::user::Role;
use crate::errors::ServiceError;
use crate::services::products::{
    AddStockRequest, CreateProductRequest, ProductListQuery, UpdateProductRequest,
};
use crate::AppState;

pub fn products_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/summary", get(product_summary))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/:id/add", patch(add_to_stock))
}

/// Creates a product (ADMIN or KEEPER).
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Validation or measurement failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "Seller not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let product = state.services.products.create(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    responses((status = 200, description = "Filtered product page")),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.list(query).await?;
    Ok(Json(products))
}

/// Stock valuation snapshot for the caller's products.
#[utoipa::path(
    get,
    path = "/api/v1/products/summary",
    responses((status = 200, description = "Counts, stock and value totals")),
    tag = "products"
)]
pub async fn product_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let counts = state.services.products.count_total(Some(user.id)).await?;
    let valuation = state.services.revenue.stock_valuation(Some(user.id)).await?;
    Ok(Json(serde_json::json!({
        "counts": counts,
        "valuation": valuation,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    responses(
        (status = 200, description = "Product found"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get(id, user.id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}",
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 400, description = "Validation or measurement failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let product = state.services.products.update(id, request).await?;
    Ok(Json(product))
}

/// Stock replenishment: increments stock and records a mirroring purchase.
#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}/add",
    request_body = AddStockRequest,
    responses(
        (status = 200, description = "Stock incremented"),
        (status = 400, description = "Quantity must be positive", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or seller not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn add_to_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let product = state
        .services
        .products
        .add_to_stock(id, request, user.id)
        .await?;
    Ok(Json(product))
}

/// Deletes a product (ADMIN only).
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    responses(
        (status = 200, description = "Product deleted"),
        (status = 403, description = "ADMIN role required", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin])?;
    let product = state.services.products.delete(id).await?;
    Ok(Json(product))
}
