use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::user::Role;
use crate::errors::ServiceError;
use crate::services::ledgers::{
    CreateCreditRequest, CreateDebitRequest, CreateExpenseRequest, ExpenseListQuery,
    LedgerListQuery, UpdateCreditRequest, UpdateExpenseRequest,
};
use crate::AppState;

pub fn expenses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/summary", get(expense_summary))
        .route(
            "/:id",
            axum::routing::patch(update_expense).delete(delete_expense),
        )
}

pub fn credits_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_credits).post(create_credit))
        .route("/summary", get(credit_summary))
        .route(
            "/:id",
            axum::routing::patch(update_credit).delete(delete_credit),
        )
}

pub fn debits_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_debits).post(create_debit))
        .route("/summary", get(debit_summary))
        .route("/overdue-sweep", post(sweep_overdue_debits))
        .route("/:id/complete", post(complete_debit))
        .route("/:id", axum::routing::delete(delete_debit))
}

// --- Expenses ---

#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let expense = state.services.expenses.create(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    responses((status = 200, description = "Expense page")),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ExpenseListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let expenses = state.services.expenses.list(query).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    patch,
    path = "/api/v1/expenses/{id}",
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated"),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    tag = "expenses"
)]
pub async fn update_expense(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExpenseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let expense = state.services.expenses.update(id, request).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{id}",
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse)
    ),
    tag = "expenses"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    state.services.expenses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses/summary",
    responses((status = 200, description = "Expense totals grouped by status")),
    tag = "expenses"
)]
pub async fn expense_summary(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.expenses.summary().await?;
    Ok(Json(summary))
}

// --- Credits ---

#[utoipa::path(
    post,
    path = "/api/v1/credits",
    request_body = CreateCreditRequest,
    responses(
        (status = 201, description = "Credit record created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    tag = "credits"
)]
pub async fn create_credit(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<CreateCreditRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let credit = state.services.credits.create(request).await?;
    Ok((StatusCode::CREATED, Json(credit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/credits",
    responses((status = 200, description = "Credit page")),
    tag = "credits"
)]
pub async fn list_credits(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<LedgerListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let credits = state.services.credits.list(query).await?;
    Ok(Json(credits))
}

#[utoipa::path(
    patch,
    path = "/api/v1/credits/{id}",
    request_body = UpdateCreditRequest,
    responses(
        (status = 200, description = "Credit record updated"),
        (status = 404, description = "Credit record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "credits"
)]
pub async fn update_credit(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCreditRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let credit = state.services.credits.update(id, request).await?;
    Ok(Json(credit))
}

#[utoipa::path(
    delete,
    path = "/api/v1/credits/{id}",
    responses(
        (status = 204, description = "Credit record deleted"),
        (status = 404, description = "Credit record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "credits"
)]
pub async fn delete_credit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    state.services.credits.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/credits/summary",
    responses((status = 200, description = "Credit totals grouped by status")),
    tag = "credits"
)]
pub async fn credit_summary(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.credits.summary().await?;
    Ok(Json(summary))
}

// --- Debits ---

#[utoipa::path(
    post,
    path = "/api/v1/debits",
    request_body = CreateDebitRequest,
    responses(
        (status = 201, description = "Debit record created"),
        (status = 400, description = "Validation failure", body = crate::errors::ErrorResponse)
    ),
    tag = "debits"
)]
pub async fn create_debit(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<CreateDebitRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let debit = state.services.debits.create(request).await?;
    Ok((StatusCode::CREATED, Json(debit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/debits",
    responses((status = 200, description = "Debit page")),
    tag = "debits"
)]
pub async fn list_debits(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<LedgerListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let debits = state.services.debits.list(query).await?;
    Ok(Json(debits))
}

#[utoipa::path(
    post,
    path = "/api/v1/debits/{id}/complete",
    responses(
        (status = 200, description = "Debit marked completed"),
        (status = 404, description = "Debit record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "debits"
)]
pub async fn complete_debit(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let debit = state.services.debits.mark_completed(id).await?;
    Ok(Json(debit))
}

/// Marks every PENDING debit past its due date as OVERDUE.
#[utoipa::path(
    post,
    path = "/api/v1/debits/overdue-sweep",
    responses((status = 200, description = "Number of debits flipped to OVERDUE")),
    tag = "debits"
)]
pub async fn sweep_overdue_debits(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    let swept = state.services.debits.sweep_overdue().await?;
    Ok(Json(serde_json::json!({ "swept": swept })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/debits/{id}",
    responses(
        (status = 204, description = "Debit record deleted"),
        (status = 404, description = "Debit record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "debits"
)]
pub async fn delete_debit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    user.require_any(&[Role::Admin, Role::Keeper])?;
    state.services.debits.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/debits/summary",
    responses((status = 200, description = "Debit totals grouped by status")),
    tag = "debits"
)]
pub async fn debit_summary(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state.services.debits.summary().await?;
    Ok(Json(summary))
}
