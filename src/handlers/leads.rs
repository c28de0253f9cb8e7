// src/handlers/leads.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::{error::AppError, payload::ApiJson},
    config::AppState,
    models::customer::{Customer, Lead, NewLead, Tag, TagKind},
};

// =============================================================================
//  VOCABULÁRIOS (STAGE / SOURCE)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TagPayload {
    #[validate(length(min = 1, message = "name is required"))]
    #[schema(example = "Interested")]
    pub name: String,
}

async fn register(app_state: &AppState, kind: TagKind, payload: TagPayload) -> Result<Tag, AppError> {
    payload.validate()?;
    app_state.lead_service.register_tag(kind, payload.name.trim()).await
}

// GET /lead/stage
#[utoipa::path(
    get,
    path = "/lead/stage",
    tag = "Leads",
    responses((status = 200, description = "Estágios conhecidos", body = Vec<Tag>)),
    security(("api_jwt" = []))
)]
pub async fn list_stages(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stages = app_state.lead_service.list_tags(TagKind::Stage).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "stages": stages }))))
}

// POST /lead/stage
#[utoipa::path(
    post,
    path = "/lead/stage",
    tag = "Leads",
    request_body = TagPayload,
    responses((status = 200, description = "Estágio registrado (idempotente)", body = Tag)),
    security(("api_jwt" = []))
)]
pub async fn create_stage(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<TagPayload>,
) -> Result<impl IntoResponse, AppError> {
    let stage = register(&app_state, TagKind::Stage, payload).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "stage": stage }))))
}

// GET /lead/source
#[utoipa::path(
    get,
    path = "/lead/source",
    tag = "Leads",
    responses((status = 200, description = "Origens conhecidas", body = Vec<Tag>)),
    security(("api_jwt" = []))
)]
pub async fn list_sources(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let sources = app_state.lead_service.list_tags(TagKind::Source).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "sources": sources }))))
}

// POST /lead/source
#[utoipa::path(
    post,
    path = "/lead/source",
    tag = "Leads",
    request_body = TagPayload,
    responses((status = 200, description = "Origem registrada (idempotente)", body = Tag)),
    security(("api_jwt" = []))
)]
pub async fn create_source(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<TagPayload>,
) -> Result<impl IntoResponse, AppError> {
    let source = register(&app_state, TagKind::Source, payload).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "source": source }))))
}

// =============================================================================
//  LEADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadPayload {
    #[validate(range(min = 1, message = "customerId must be a positive integer"))]
    #[schema(example = 42)]
    pub customer_id: i32,
    #[validate(length(min = 1, message = "stage is required"))]
    #[schema(example = "Callback")]
    pub stage: String,
    pub source: Option<String>,
    pub comments: Option<String>,
    pub store_id: Option<i32>,
    pub callback_date: Option<DateTime<Utc>>,
}

// POST /lead
#[utoipa::path(
    post,
    path = "/lead",
    tag = "Leads",
    request_body = CreateLeadPayload,
    responses(
        (status = 200, description = "Lead acrescentado ao histórico, ou envelope de erro", body = Lead)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lead(
    State(app_state): State<AppState>,
    ApiJson(payload): ApiJson<CreateLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state
        .lead_service
        .create(NewLead {
            customer_id: payload.customer_id,
            stage: payload.stage.trim().to_string(),
            source: payload.source,
            comments: payload.comments,
            store_id: payload.store_id,
            callback_date: payload.callback_date,
            ..Default::default()
        })
        .await?;

    Ok((StatusCode::OK, Json(json!({ "valid": true, "lead": lead }))))
}

// GET /lead/customer/{id}
#[utoipa::path(
    get,
    path = "/lead/customer/{id}",
    tag = "Leads",
    params(("id" = i32, Path, description = "ID do cliente")),
    responses((status = 200, description = "Histórico do cliente, mais recente primeiro", body = Vec<Lead>)),
    security(("api_jwt" = []))
)]
pub async fn customer_leads(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let leads = app_state.lead_service.leads_for_customer(id).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "leads": leads }))))
}

// GET /lead/customers/stage/{stage}
#[utoipa::path(
    get,
    path = "/lead/customers/stage/{stage}",
    tag = "Leads",
    params(("stage" = String, Path, description = "Estágio do lead mais recente")),
    responses((status = 200, description = "Clientes no estágio", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn customers_by_stage(
    State(app_state): State<AppState>,
    Path(stage): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.lead_service.customers_in_stage(&stage).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "customers": customers }))))
}

// GET /lead/customers/source/{source}
#[utoipa::path(
    get,
    path = "/lead/customers/source/{source}",
    tag = "Leads",
    params(("source" = String, Path, description = "Origem de qualquer lead do cliente")),
    responses((status = 200, description = "Clientes da origem", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn customers_by_source(
    State(app_state): State<AppState>,
    Path(source): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.lead_service.customers_from_source(&source).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "customers": customers }))))
}

// GET /lead/today-callbacks
#[utoipa::path(
    get,
    path = "/lead/today-callbacks",
    tag = "Leads",
    responses((status = 200, description = "Clientes com retorno marcado para hoje", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn today_callbacks(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.lead_service.callbacks_on(Local::now().date_naive()).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "customers": customers }))))
}
