use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::services::revenue::Window;
use crate::services::sales::{CreateSaleRequest, SaleListQuery};
use crate::AppState;

pub fn sales_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/days", get(daily_rollup))
        .route("/weeks", get(weekly_rollup))
        .route("/months", get(monthly_rollup))
        .route("/years", get(yearly_rollup))
        .route("/:id", get(get_sale))
}

/// Creates a sale: stock is reserved and the record persisted atomically.
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale created with current stock valuation"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.sales.create(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales",
    responses((status = 200, description = "Sales page with all-time summary")),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let sales = state.services.sales.list(query).await?;
    Ok(Json(sales))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    responses(
        (status = 200, description = "Sale found"),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.get(id).await?;
    Ok(Json(sale))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/days",
    responses((status = 200, description = "Per-day rollup, chronologically ascending")),
    tag = "sales"
)]
pub async fn daily_rollup(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let rollup = state.services.revenue.rollup(user.id, Window::Day).await?;
    Ok(Json(rollup))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/weeks",
    responses((status = 200, description = "Per-ISO-week rollup, chronologically ascending")),
    tag = "sales"
)]
pub async fn weekly_rollup(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let rollup = state.services.revenue.rollup(user.id, Window::Week).await?;
    Ok(Json(rollup))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/months",
    responses((status = 200, description = "Per-month rollup, chronologically ascending")),
    tag = "sales"
)]
pub async fn monthly_rollup(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let rollup = state.services.revenue.rollup(user.id, Window::Month).await?;
    Ok(Json(rollup))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/years",
    responses((status = 200, description = "Per-year rollup, chronologically ascending")),
    tag = "sales"
)]
pub async fn yearly_rollup(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let rollup = state.services.revenue.rollup(user.id, Window::Year).await?;
    Ok(Json(rollup))
}
