use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};

use crate::auth::LoginCredentials;
use crate::errors::ServiceError;
use crate::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Exchanges credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Token issued", body = crate::auth::TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 403, description = "Account not active", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<impl IntoResponse, ServiceError> {
    let token = state.services.auth.login(credentials).await?;
    Ok(Json(token))
}
