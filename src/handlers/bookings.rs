// src/handlers/bookings.rs

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
    common::{error::AppError, lenient, payload::ApiJson},
    config::AppState,
    middleware::auth::AuthenticatedEmployee,
    models::booking::{Booking, BookingOvers, BookingRequest, BookingStatus, BookingTerms, BookingType},
    services::booking_service::parse_booking_date,
};

// =============================================================================
//  CRIAÇÃO (FUNCIONÁRIO)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    #[validate(range(min = 1, message = "storeId must be a positive integer"))]
    #[schema(example = 2)]
    pub store_id: i32,
    #[validate(range(min = 1, message = "customerId must be a positive integer"))]
    #[schema(example = 42)]
    pub customer_id: i32,
    pub booking_type: BookingType,
    pub package_id: Option<i32>,
    pub price: Option<i32>,
    pub overs: Option<i32>,
    #[schema(example = "2024-05-01")]
    pub date: Option<String>,
    #[schema(example = "Evening")]
    pub time: Option<String>,
}

impl CreateBookingPayload {
    fn into_request(self) -> Result<BookingRequest, AppError> {
        let terms = match self.booking_type {
            BookingType::Package => BookingTerms::Package {
                package_id: self
                    .package_id
                    .ok_or_else(|| AppError::InvalidPayload("packageId is required.".to_string()))?,
            },
            BookingType::Custom => match (self.price, self.overs) {
                (Some(price), Some(overs)) => BookingTerms::Custom { price: Some(price), overs },
                _ => {
                    return Err(AppError::InvalidPayload(
                        "price and overs are required for Custom bookings.".to_string(),
                    ));
                }
            },
            BookingType::Enquiry | BookingType::App => {
                return Err(AppError::InvalidPayload("bookingType must be Package or Custom.".to_string()));
            }
        };

        Ok(BookingRequest {
            customer_id: self.customer_id,
            store_id: self.store_id,
            terms,
            date: self.date.as_deref().map(parse_booking_date).transpose()?,
            time: self.time,
            booking_type: self.booking_type,
        })
    }
}

// POST /emp/booking
#[utoipa::path(
    post,
    path = "/emp/booking",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 200, description = "Reserva criada", body = Booking),
        (status = 200, description = "Envelope de erro {valid:false} ou {status:400}")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(employee): AuthenticatedEmployee,
    ApiJson(payload): ApiJson<CreateBookingPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let booking = app_state.booking_service.create_for_customer(payload.into_request()?).await?;
    tracing::info!(booking_id = booking.id, employee_id = employee.id, "Reserva lançada pelo funcionário");

    Ok((StatusCode::OK, Json(json!({ "valid": true, "booking": booking }))))
}

// =============================================================================
//  CONSUMO DE OVERS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayedOversPayload {
    // O painel manda o número ora como string, ora como número
    #[serde(default, deserialize_with = "lenient::int")]
    #[validate(range(min = 1, message = "playedOvers must be a positive integer."))]
    #[schema(value_type = i32, example = 2)]
    pub played_overs: Option<i32>,
}

impl PlayedOversPayload {
    fn overs(&self) -> Result<i32, AppError> {
        self.validate()?;
        self.played_overs
            .ok_or_else(|| AppError::InvalidPayload("playedOvers is required.".to_string()))
    }
}

// PUT /emp/booking/{id}
#[utoipa::path(
    put,
    path = "/emp/booking/{id}",
    tag = "Bookings",
    request_body = PlayedOversPayload,
    params(("id" = i32, Path, description = "ID da reserva")),
    responses((status = 200, description = "Saldo atualizado", body = Booking)),
    security(("api_jwt" = []))
)]
pub async fn consume_overs(
    State(app_state): State<AppState>,
    employee: AuthenticatedEmployee,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<PlayedOversPayload>,
) -> Result<impl IntoResponse, AppError> {
    let played_overs = payload.overs()?;

    let booking = app_state
        .booking_service
        .consume_overs(id, played_overs, Some(employee.0.id), employee.store_scope())
        .await?;

    Ok((StatusCode::OK, Json(json!({ "valid": true, "booking": booking }))))
}

// PUT /admin/booking/{id}
#[utoipa::path(
    put,
    path = "/admin/booking/{id}",
    tag = "Admin",
    request_body = PlayedOversPayload,
    params(("id" = i32, Path, description = "ID da reserva")),
    responses((status = 200, description = "Saldo atualizado", body = Booking)),
    security(("api_jwt" = []))
)]
pub async fn admin_consume_overs(
    State(app_state): State<AppState>,
    AuthenticatedEmployee(admin): AuthenticatedEmployee,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<PlayedOversPayload>,
) -> Result<impl IntoResponse, AppError> {
    let played_overs = payload.overs()?;

    let booking = app_state.booking_service.consume_overs(id, played_overs, Some(admin.id), None).await?;

    Ok((StatusCode::OK, Json(json!({ "valid": true, "booking": booking }))))
}

// =============================================================================
//  CONSULTAS
// =============================================================================

// GET /emp/booking
#[utoipa::path(
    get,
    path = "/emp/booking",
    tag = "Bookings",
    responses((status = 200, description = "Reservas da loja, mais recentes primeiro", body = Vec<Booking>)),
    security(("api_jwt" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    employee: AuthenticatedEmployee,
) -> Result<impl IntoResponse, AppError> {
    let bookings = app_state.booking_service.list(employee.store_scope(), None).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "bookings": bookings }))))
}

// 0 = PENDING, 1 = COMPLETED
fn status_from_code(code: u8) -> Result<BookingStatus, AppError> {
    match code {
        0 => Ok(BookingStatus::Pending),
        1 => Ok(BookingStatus::Completed),
        _ => Err(AppError::InvalidPayload("status must be 0 (PENDING) or 1 (COMPLETED).".to_string())),
    }
}

// GET /emp/booking/status/{status}
#[utoipa::path(
    get,
    path = "/emp/booking/status/{status}",
    tag = "Bookings",
    params(("status" = u8, Path, description = "0 = PENDING, 1 = COMPLETED")),
    responses((status = 200, description = "Reservas no status", body = Vec<Booking>)),
    security(("api_jwt" = []))
)]
pub async fn list_bookings_by_status(
    State(app_state): State<AppState>,
    employee: AuthenticatedEmployee,
    Path(status): Path<u8>,
) -> Result<impl IntoResponse, AppError> {
    let status = status_from_code(status)?;
    let bookings = app_state.booking_service.list(employee.store_scope(), Some(status)).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "bookings": bookings }))))
}

// GET /emp/booking/{id}
#[utoipa::path(
    get,
    path = "/emp/booking/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "ID da reserva")),
    responses((status = 200, description = "Reserva", body = Booking)),
    security(("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    employee: AuthenticatedEmployee,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let booking = app_state.booking_service.find(id, employee.store_scope()).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "booking": booking }))))
}

// GET /emp/booking/logs
#[utoipa::path(
    get,
    path = "/emp/booking/logs",
    tag = "Bookings",
    responses((status = 200, description = "Auditoria de overs jogados", body = Vec<BookingOvers>)),
    security(("api_jwt" = []))
)]
pub async fn booking_logs(
    State(app_state): State<AppState>,
    employee: AuthenticatedEmployee,
) -> Result<impl IntoResponse, AppError> {
    let logs = app_state.booking_service.logs(employee.store_scope()).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "logs": logs }))))
}

// GET /admin/booking
#[utoipa::path(
    get,
    path = "/admin/booking",
    tag = "Admin",
    responses((status = 200, description = "Todas as reservas", body = Vec<Booking>)),
    security(("api_jwt" = []))
)]
pub async fn admin_list_bookings(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let bookings = app_state.booking_service.list(None, None).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "bookings": bookings }))))
}

// GET /admin/booking/store/{store_id}
#[utoipa::path(
    get,
    path = "/admin/booking/store/{store_id}",
    tag = "Admin",
    params(("store_id" = i32, Path, description = "ID da loja")),
    responses((status = 200, description = "Reservas da loja", body = Vec<Booking>)),
    security(("api_jwt" = []))
)]
pub async fn admin_list_store_bookings(
    State(app_state): State<AppState>,
    Path(store_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = app_state.booking_service.list(Some(store_id), None).await?;
    Ok((StatusCode::OK, Json(json!({ "valid": true, "bookings": bookings }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_support::test_state,
        db::memory::MemoryStorage,
        models::auth::{Employee, EmployeeRole},
    };
    use axum::response::Response;
    use chrono::Utc;
    use serde_json::Value;

    fn staff(role: EmployeeRole, store_id: Option<i32>) -> AuthenticatedEmployee {
        AuthenticatedEmployee(Employee {
            id: 5,
            name: Some("Priya".into()),
            email: "priya@striketheball.in".into(),
            password_hash: String::new(),
            phone: None,
            employee_code: None,
            role,
            store_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn employee_consumes_overs_and_the_audit_row_is_written() {
        let storage = MemoryStorage::seeded();
        let booking = storage.seed_booking(1, 2, 10);

        let response = consume_overs(
            State(test_state(&storage)),
            staff(EmployeeRole::Employee, Some(2)),
            Path(booking.id),
            ApiJson(PlayedOversPayload { played_overs: Some(10) }),
        )
        .await
        .unwrap()
        .into_response();

        let body = body_json(response).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["booking"]["oversLeft"], 0);
        assert_eq!(body["booking"]["status"], "COMPLETED");

        let state = storage.snapshot();
        assert_eq!(state.booking_overs.len(), 1);
        assert_eq!(state.booking_overs[0].employee_id, Some(5));
    }

    #[tokio::test]
    async fn employee_of_another_store_gets_not_found() {
        let storage = MemoryStorage::seeded();
        let booking = storage.seed_booking(1, 2, 10);

        let err = consume_overs(
            State(test_state(&storage)),
            staff(EmployeeRole::Employee, Some(3)),
            Path(booking.id),
            ApiJson(PlayedOversPayload { played_overs: Some(1) }),
        )
        .await
        .err()
        .expect("loja diferente");

        assert_eq!(err.envelope()["error"], "Booking not found.");
        assert!(storage.snapshot().booking_overs.is_empty());
    }

    #[tokio::test]
    async fn zero_played_overs_is_rejected_before_touching_storage() {
        let storage = MemoryStorage::seeded();
        let booking = storage.seed_booking(1, 2, 10);

        let err = admin_consume_overs(
            State(test_state(&storage)),
            staff(EmployeeRole::Admin, None),
            Path(booking.id),
            ApiJson(PlayedOversPayload { played_overs: Some(0) }),
        )
        .await
        .err()
        .expect("validação");

        assert_eq!(err.envelope()["status"], 400);
        assert_eq!(storage.snapshot().bookings[0].overs_left, 10);
    }

    #[tokio::test]
    async fn played_overs_sent_as_string_is_accepted() {
        let storage = MemoryStorage::seeded();
        let booking = storage.seed_booking(1, 2, 10);
        let payload: PlayedOversPayload = serde_json::from_value(serde_json::json!({ "playedOvers": "3" })).unwrap();

        let response = admin_consume_overs(
            State(test_state(&storage)),
            staff(EmployeeRole::Admin, None),
            Path(booking.id),
            ApiJson(payload),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["booking"]["oversLeft"], 7);
    }

    #[tokio::test]
    async fn missing_played_overs_is_an_invalid_payload() {
        let storage = MemoryStorage::seeded();
        let booking = storage.seed_booking(1, 2, 10);
        let payload: PlayedOversPayload = serde_json::from_value(serde_json::json!({})).unwrap();

        let err = consume_overs(
            State(test_state(&storage)),
            staff(EmployeeRole::Employee, Some(2)),
            Path(booking.id),
            ApiJson(payload),
        )
        .await
        .err()
        .expect("sem playedOvers");

        let body = err.envelope();
        assert_eq!(body["status"], 400);
        assert_eq!(body["error_description"], "playedOvers is required.");
        assert_eq!(storage.snapshot().bookings[0].overs_left, 10);
    }

    #[tokio::test]
    async fn custom_booking_requires_price_and_overs() {
        let storage = MemoryStorage::seeded();
        let payload = CreateBookingPayload {
            store_id: 1,
            customer_id: 1,
            booking_type: BookingType::Custom,
            package_id: None,
            price: None,
            overs: Some(6),
            date: None,
            time: None,
        };

        let err = create_booking(State(test_state(&storage)), staff(EmployeeRole::Employee, Some(1)), ApiJson(payload))
            .await
            .err()
            .expect("sem preço");
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn package_booking_for_unknown_customer_is_a_referential_miss() {
        let storage = MemoryStorage::seeded();
        let payload = CreateBookingPayload {
            store_id: 1,
            customer_id: 999,
            booking_type: BookingType::Package,
            package_id: Some(2),
            price: None,
            overs: None,
            date: Some("2024-05-01".into()),
            time: Some("Morning".into()),
        };

        let err = create_booking(State(test_state(&storage)), staff(EmployeeRole::Employee, Some(1)), ApiJson(payload))
            .await
            .err()
            .expect("cliente inexistente");
        assert_eq!(err.envelope()["error"], "Customer not found.");
        assert!(storage.snapshot().bookings.is_empty());
    }

    #[test]
    fn status_codes_map_to_booking_status() {
        assert_eq!(status_from_code(0).unwrap(), BookingStatus::Pending);
        assert_eq!(status_from_code(1).unwrap(), BookingStatus::Completed);
        assert!(status_from_code(2).is_err());
    }
}
