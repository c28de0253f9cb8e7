// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{error::AppError, payload::ApiJson},
    config::AppState,
    middleware::auth::AuthenticatedEmployee,
    models::auth::{AuthResponse, Employee, LoginPayload},
};

// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Funcionário e token JWT (7 dias)", body = AuthResponse)
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state.auth_service.login(&payload.email, &payload.password).await?;
    Ok((StatusCode::OK, Json(response)))
}

// GET /auth/me
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses((status = 200, description = "Funcionário do token", body = Employee)),
    security(("api_jwt" = []))
)]
pub async fn me(AuthenticatedEmployee(employee): AuthenticatedEmployee) -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "valid": true, "employee": employee })))
}
