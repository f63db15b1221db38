use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::user::Role;
use crate::errors::ServiceError;
use crate::services::proformas::{
    CreateProformaRequest, ProformaListQuery, UpdateProformaRequest, UpdateStatusRequest,
};
use crate::AppState;

pub fn proformas_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_proformas).post(create_proforma))
        .route(
            "/:id",
            get(get_proforma)
                .patch(update_proforma)
                .delete(delete_proforma),
        )
        .route("/:id/status", patch(update_status))
}

/// Creates a proforma invoice, reserving stock for every line item.
#[utoipa::path(
    post,
    path = "/api/v1/proforma",
    request_body = CreateProformaRequest,
    responses(
        (status = 201, description = "Invoice created"),
        (status = 404, description = "A referenced product is missing", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock for a line item", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice number collision", body = crate::errors::ErrorResponse)
    ),
    tag = "proforma"
)]
pub async fn create_proforma(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateProformaRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let proforma = state.services.proformas.create(request).await?;
    Ok((StatusCode::CREATED, Json(proforma)))
}

#[utoipa::path(
    get,
    path = "/api/v1/proforma",
    responses((status = 200, description = "Invoice page, newest first")),
    tag = "proforma"
)]
pub async fn list_proformas(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ProformaListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let proformas = state.services.proformas.list(query).await?;
    Ok(Json(proformas))
}

#[utoipa::path(
    get,
    path = "/api/v1/proforma/{id}",
    responses(
        (status = 200, description = "Invoice with line items"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "proforma"
)]
pub async fn get_proforma(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let proforma = state.services.proformas.get(id).await?;
    Ok(Json(proforma))
}

/// Updates an invoice. Supplying `items` restores the old reservations and
/// re-reserves the new list atomically; the invoice number is immutable.
#[utoipa::path(
    patch,
    path = "/api/v1/proforma/{id}",
    request_body = UpdateProformaRequest,
    responses(
        (status = 200, description = "Invoice updated"),
        (status = 400, description = "Invoice number is immutable", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice or product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock for a new item", body = crate::errors::ErrorResponse)
    ),
    tag = "proforma"
)]
pub async fn update_proforma(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProformaRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let proforma = state.services.proformas.update(id, request).await?;
    Ok(Json(proforma))
}

#[utoipa::path(
    patch,
    path = "/api/v1/proforma/{id}/status",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "proforma"
)]
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let proforma = state.services.proformas.update_status(id, request).await?;
    Ok(Json(proforma))
}

/// Deletes a draft invoice and releases its stock reservations.
#[utoipa::path(
    delete,
    path = "/api/v1/proforma/{id}",
    responses(
        (status = 204, description = "Invoice deleted, stock restored"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Only draft invoices can be deleted", body = crate::errors::ErrorResponse)
    ),
    tag = "proforma"
)]
pub async fn delete_proforma(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin])?;
    state.services.proformas.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
