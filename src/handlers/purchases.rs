use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::entities::user::Role;
use crate::errors::ServiceError;
use crate::services::purchases::{CreatePurchaseRequest, PurchaseListQuery};
use crate::AppState;

pub fn purchases_router() -> Router<AppState> {
    Router::new().route("/", get(list_purchases).post(create_purchase))
}

/// Creates a purchase: the stock increment and the record are one unit.
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Purchase created"),
        (status = 404, description = "Product or seller not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchases"
)]
pub async fn create_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let purchase = state.services.purchases.create(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchases",
    responses((status = 200, description = "Purchase page with running total")),
    tag = "purchases"
)]
pub async fn list_purchases(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<PurchaseListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let purchases = state.services.purchases.list(query).await?;
    Ok(Json(purchases))
}
