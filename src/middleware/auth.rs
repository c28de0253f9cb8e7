// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{common::error::AppError, config::AppState, models::auth::Employee};

// Lê o Bearer token e carrega o funcionário dono dele
async fn authenticate(app_state: &AppState, parts: &mut Parts) -> Result<Employee, AppError> {
    let TypedHeader(Authorization(bearer)) = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, app_state)
        .await
        .map_err(|rejection| {
            if rejection.is_missing() {
                AppError::AuthenticationFailed("token is required".to_string())
            } else {
                AppError::AuthenticationFailed("Invalid token type".to_string())
            }
        })?;

    app_state.auth_service.validate_token(bearer.token()).await
}

/// Qualquer funcionário autenticado (admin, subadmin ou de loja).
pub async fn auth_guard(State(app_state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let employee = authenticate(&app_state, &mut parts).await?;

    // Insere o funcionário nos "extensions" da requisição
    parts.extensions.insert(employee);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Só o admin global.
pub async fn admin_guard(State(app_state): State<AppState>, request: Request, next: Next) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();
    let employee = authenticate(&app_state, &mut parts).await?;

    if !employee.is_admin() {
        tracing::warn!(employee_id = employee.id, "Acesso de admin negado");
        return Err(AppError::Forbidden("Admin does not exist".to_string()));
    }

    parts.extensions.insert(employee);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

// Extrator para obter o funcionário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedEmployee(pub Employee);

impl AuthenticatedEmployee {
    /// Loja à qual as consultas ficam restritas (`None` para o admin).
    pub fn store_scope(&self) -> Option<i32> {
        if self.0.is_admin() { None } else { self.0.store_id }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedEmployee
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Employee>()
            .cloned()
            .map(AuthenticatedEmployee)
            .ok_or_else(|| AppError::AuthenticationFailed("token is required".to_string()))
    }
}
