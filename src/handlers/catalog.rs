// src/handlers/catalog.rs
//
// Dados de referência. Pacotes são públicos (o app lista antes do login);
// lojas ficam atrás do admin_guard.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    models::booking::{Package, Store},
};

// GET /admin/store
#[utoipa::path(
    get,
    path = "/admin/store",
    tag = "Catalog",
    responses((status = 200, description = "Lojas", body = Vec<Store>)),
    security(("api_jwt" = []))
)]
pub async fn list_stores(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stores = app_state.booking_service.stores().await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "stores": stores }))))
}

// GET /admin/package
#[utoipa::path(
    get,
    path = "/admin/package",
    tag = "Catalog",
    responses((status = 200, description = "Pacotes", body = Vec<Package>))
)]
pub async fn list_packages(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let packages = app_state.booking_service.packages().await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "packages": packages }))))
}
