// src/handlers/webhooks.rs
//
// Entradas dos provedores externos. O corpo é lido como bytes e decodificado
// aqui, para que um payload torto vire um no-op logado e não um 4xx do axum.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::booking::Booking,
    models::webhook::{DirectBookingPayload, DoubleTickPayload, IvrPayload, SuperfonePayload, WhatsAppPayload},
    services::outcome::WebhookOutcome,
};

// =============================================================================
//  AUXILIARES
// =============================================================================

// Resposta dos webhooks assíncronos
#[derive(Debug, Serialize, ToSchema)]
pub struct Ack {
    #[schema(example = 200)]
    pub status: u16,
    #[schema(example = "booked")]
    pub outcome: &'static str,
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, String> {
    serde_json::from_slice(body).map_err(|e| format!("payload ilegível: {}", e))
}

// Uma linha de log por entrega, com o motivo quando nada foi reservado
fn log_outcome(result: &Result<WebhookOutcome, AppError>) {
    match result {
        Ok(WebhookOutcome::Booked(booking)) => {
            tracing::info!(booking_id = booking.id, outcome = "booked", "Entrega processada")
        }
        Ok(WebhookOutcome::Ignored(reason)) => tracing::info!(outcome = "ignored", "Nenhuma reserva: {}", reason),
        Ok(outcome) => tracing::info!(outcome = outcome.label(), "Entrega processada"),
        Err(e) => tracing::error!("Falha ao processar entrega: {:?}", e),
    }
}

// Provedores que desativam o webhook em qualquer resposta diferente de 200
fn acknowledge(result: Result<WebhookOutcome, AppError>) -> Response {
    log_outcome(&result);
    let outcome = result.map(|o| o.label()).unwrap_or("failed");
    (StatusCode::OK, Json(Ack { status: 200, outcome })).into_response()
}

// IVR, enquiry e app: falha de infraestrutura é um 500 de verdade
fn internal_failure(err: AppError) -> Response {
    tracing::error!("Erro Interno do Servidor: {:?}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(err.envelope())).into_response()
}

fn delivery_span(channel: &'static str) -> tracing::Span {
    tracing::info_span!("webhook", channel, delivery_id = %Uuid::new_v4())
}

// =============================================================================
//  WHATSAPP
// =============================================================================

// POST /webhook
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "Webhooks",
    request_body(
        content = serde_json::Value,
        content_type = "application/json",
        description = "Envelope do WhatsApp Business"
    ),
    responses((status = 200, description = "Sempre 200; o provedor não reenvia", body = Ack))
)]
pub async fn whatsapp(State(app_state): State<AppState>, body: Bytes) -> Response {
    async move {
        let result = match decode::<WhatsAppPayload>(&body) {
            Ok(payload) => app_state.whatsapp_service.handle(&payload, Utc::now()).await,
            Err(reason) => Ok(WebhookOutcome::Ignored(reason)),
        };
        acknowledge(result)
    }
    .instrument(delivery_span("whatsapp"))
    .await
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// GET /webhook (handshake de assinatura)
#[utoipa::path(
    get,
    path = "/webhook",
    tag = "Webhooks",
    params(
        ("hub.mode" = String, Query, description = "Sempre 'subscribe'"),
        ("hub.verify_token" = String, Query, description = "Token configurado no app da Meta"),
        ("hub.challenge" = String, Query, description = "Valor a ecoar")
    ),
    responses(
        (status = 200, description = "Challenge ecoado", body = String),
        (status = 403, description = "Token não confere")
    )
)]
pub async fn verify_whatsapp(State(app_state): State<AppState>, Query(params): Query<VerifyParams>) -> Response {
    let expected = app_state.config.wa_verify_token.as_deref();
    match (params.mode.as_deref(), params.verify_token.as_deref(), expected) {
        (Some("subscribe"), Some(token), Some(expected)) if token == expected => {
            tracing::info!("Webhook do WhatsApp verificado");
            (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
        }
        _ => {
            tracing::warn!("Verificação do webhook recusada");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

// =============================================================================
//  TELEFONIA
// =============================================================================

// POST /ivrhook
#[utoipa::path(
    post,
    path = "/ivrhook",
    tag = "Webhooks",
    request_body = IvrPayload,
    responses(
        (status = 200, description = "Chamada registrada", body = Ack),
        (status = 500, description = "Falha de armazenamento")
    )
)]
pub async fn ivr(State(app_state): State<AppState>, body: Bytes) -> Response {
    async move {
        let result = match decode::<IvrPayload>(&body) {
            Ok(payload) => app_state.ivr_service.handle(&payload, Local::now().date_naive()).await,
            Err(reason) => Ok(WebhookOutcome::Ignored(reason)),
        };
        match result {
            Err(err) if err.is_internal() => internal_failure(err),
            result => acknowledge(result),
        }
    }
    .instrument(delivery_span("ivr"))
    .await
}

// POST /doubletickhook
#[utoipa::path(
    post,
    path = "/doubletickhook",
    tag = "Webhooks",
    request_body = DoubleTickPayload,
    responses((status = 200, description = "Sempre 200", body = Ack))
)]
pub async fn doubletick(State(app_state): State<AppState>, body: Bytes) -> Response {
    async move {
        let result = match decode::<DoubleTickPayload>(&body) {
            Ok(payload) => app_state.call_center_service.handle_doubletick(&payload).await,
            Err(reason) => Ok(WebhookOutcome::Ignored(reason)),
        };
        acknowledge(result)
    }
    .instrument(delivery_span("doubletick"))
    .await
}

// POST /superfonehook
#[utoipa::path(
    post,
    path = "/superfonehook",
    tag = "Webhooks",
    request_body = SuperfonePayload,
    responses((status = 200, description = "Sempre 200", body = Ack))
)]
pub async fn superfone(State(app_state): State<AppState>, body: Bytes) -> Response {
    async move {
        let result = match decode::<SuperfonePayload>(&body) {
            Ok(payload) => app_state.call_center_service.handle_superfone(&payload).await,
            Err(reason) => Ok(WebhookOutcome::Ignored(reason)),
        };
        acknowledge(result)
    }
    .instrument(delivery_span("superfone"))
    .await
}

// =============================================================================
//  RESERVA DIRETA
// =============================================================================

// Chamador síncrono: erro de negócio vai no envelope, falha interna vira 500
fn booking_response(result: Result<Booking, AppError>, message: Option<&str>) -> Response {
    match result {
        Ok(booking) => {
            tracing::info!(booking_id = booking.id, outcome = "booked", "Entrega processada");
            let body = match message {
                Some(message) => json!({ "valid": true, "message": message, "booking": booking }),
                None => json!({ "valid": true, "booking": booking }),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) if err.is_internal() => internal_failure(err),
        Err(err) => {
            tracing::info!(outcome = "rejected", "Reserva recusada: {}", err);
            err.into_response()
        }
    }
}

// POST /enquiry
#[utoipa::path(
    post,
    path = "/enquiry",
    tag = "Webhooks",
    request_body = DirectBookingPayload,
    responses(
        (status = 200, description = "{valid:true, booking} ou envelope de erro", body = Booking),
        (status = 500, description = "Falha de armazenamento")
    )
)]
pub async fn enquiry(State(app_state): State<AppState>, body: Bytes) -> Response {
    async move {
        let result = match decode::<DirectBookingPayload>(&body) {
            Ok(payload) => app_state.direct_booking_service.enquiry(&payload).await,
            Err(reason) => Err(AppError::InvalidPayload(reason)),
        };
        booking_response(result, None)
    }
    .instrument(delivery_span("enquiry"))
    .await
}

// POST /user/book-slot
#[utoipa::path(
    post,
    path = "/user/book-slot",
    tag = "App",
    request_body = DirectBookingPayload,
    responses(
        (status = 200, description = "Reserva criada ou envelope {valid:false}", body = Booking),
        (status = 500, description = "Falha de armazenamento")
    )
)]
pub async fn book_slot(State(app_state): State<AppState>, body: Bytes) -> Response {
    async move {
        let result = match decode::<DirectBookingPayload>(&body) {
            Ok(payload) => app_state.direct_booking_service.book_slot(&payload).await,
            Err(reason) => Err(AppError::InvalidPayload(reason)),
        };
        booking_response(result, Some("Slot booking successfully!"))
    }
    .instrument(delivery_span("app"))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::test_support::test_state, db::memory::MemoryStorage};
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn bytes(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[tokio::test]
    async fn whatsapp_garbage_is_acknowledged() {
        let storage = MemoryStorage::seeded();
        let response = whatsapp(State(test_state(&storage)), Bytes::from_static(b"not json")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["outcome"], "ignored");
        assert!(storage.snapshot().customers.is_empty());
    }

    #[tokio::test]
    async fn whatsapp_storage_failure_still_answers_200() {
        let storage = MemoryStorage::seeded();
        storage.set_failing(true);
        let payload = json!({
            "entry": [{ "changes": [{ "value": {
                "contacts": [{ "wa_id": "919900011122" }],
                "messages": [{ "type": "text" }]
            }}]}]
        });

        let response = whatsapp(State(test_state(&storage)), bytes(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["outcome"], "failed");
    }

    #[tokio::test]
    async fn ivr_storage_failure_is_a_real_500() {
        let storage = MemoryStorage::seeded();
        storage.set_failing(true);
        let payload = json!({ "call_id": "c-1", "caller_no": "9900011122", "keypress": "1-DG-1-DG-1-DG-1-DG-1" });

        let response = ivr(State(test_state(&storage)), bytes(payload)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["status"], 500);
    }

    #[tokio::test]
    async fn enquiry_missing_package_is_invalid_payload_with_200() {
        let storage = MemoryStorage::seeded();
        let payload = json!({
            "name": "Rahul",
            "phone": "919900011122",
            "storeId": 1,
            "date": "2024-05-01",
            "time": "Evening"
        });

        let response = enquiry(State(test_state(&storage)), bytes(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "Invalid payload");
        assert!(storage.snapshot().customers.is_empty());
    }

    #[tokio::test]
    async fn enquiry_success_wraps_the_booking() {
        let storage = MemoryStorage::seeded();
        let payload = json!({
            "name": "Rahul",
            "phone": "919900011122",
            "packageId": 1,
            "storeId": 3,
            "date": "2024-05-01",
            "time": "Evening"
        });

        let body = body_json(enquiry(State(test_state(&storage)), bytes(payload)).await).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["booking"]["bookingType"], "Enquiry");
        assert_eq!(body["booking"]["overs"], 5);
    }

    #[tokio::test]
    async fn book_slot_success_carries_the_app_message() {
        let storage = MemoryStorage::seeded();
        let payload = json!({
            "name": "Asha",
            "phone": "919811122233",
            "packageId": 2,
            "storeId": 1,
            "date": "2024-05-02",
            "time": "Morning"
        });

        let body = body_json(book_slot(State(test_state(&storage)), bytes(payload)).await).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["message"], "Slot booking successfully!");
    }

    #[tokio::test]
    async fn verify_echoes_challenge_only_for_the_configured_token() {
        let storage = MemoryStorage::seeded();
        let ok = verify_whatsapp(
            State(test_state(&storage)),
            Query(VerifyParams {
                mode: Some("subscribe".into()),
                verify_token: Some("verifica-me".into()),
                challenge: Some("1158201444".into()),
            }),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(ok.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"1158201444");

        let denied = verify_whatsapp(
            State(test_state(&storage)),
            Query(VerifyParams {
                mode: Some("subscribe".into()),
                verify_token: Some("errado".into()),
                challenge: Some("1158201444".into()),
            }),
        )
        .await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn doubletick_tag_is_recorded() {
        let storage = MemoryStorage::seeded();
        let payload = json!({ "customerPhone": "919900011122", "tagName": "Hot", "tagAdded": true });

        let body = body_json(doubletick(State(test_state(&storage)), bytes(payload)).await).await;
        assert_eq!(body["outcome"], "recorded");
        assert!(storage.snapshot().stages.contains(&"Hot".to_string()));
    }
}
