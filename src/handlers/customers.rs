// src/handlers/customers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{error::AppError, payload::ApiJson},
    config::AppState,
    models::customer::Customer,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "name is required"))]
    #[schema(example = "Rahul")]
    pub name: String,
    #[validate(length(min = 10, max = 15, message = "phone must have 10 to 15 digits"))]
    #[schema(example = "919900011122")]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

// POST /customer
#[utoipa::path(
    post,
    path = "/customer",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 200, description = "Cliente criado", body = Customer),
        (status = 200, description = "Telefone já cadastrado ({status:400})")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_service
        .create(payload.name.trim(), payload.phone.trim(), payload.email.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(json!({ "valid": true, "customer": customer }))))
}

// GET /customer
#[utoipa::path(
    get,
    path = "/customer",
    tag = "Customers",
    responses((status = 200, description = "Clientes, mais recentes primeiro", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.customer_service.list().await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "customers": customers }))))
}

// DELETE /customer/{id}
#[utoipa::path(
    delete,
    path = "/customer/{id}",
    tag = "Customers",
    params(("id" = i32, Path, description = "ID do cliente")),
    responses((status = 200, description = "Cliente removido", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.delete(id).await?;
    tracing::info!(customer_id = customer.id, "Cliente removido");
    Ok((StatusCode::OK, Json(json!({ "valid": true, "customer": customer }))))
}
