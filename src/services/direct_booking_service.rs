// src/services/direct_booking_service.rs
//
// Formulário de enquiry do site e reserva pelo app. O payload já vem
// estruturado; só validamos e materializamos numa única transação.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    db::Storage,
    models::{
        booking::{Booking, BookingRequest, BookingTerms, BookingType},
        customer::Channel,
        webhook::DirectBookingPayload,
    },
    services::{
        booking_service::{parse_booking_date, BookingService},
        customer_service::CustomerService,
    },
};

// Pedido já validado
#[derive(Debug, Clone)]
struct DirectBooking {
    name: Option<String>,
    phone: String,
    package_id: i32,
    store_id: i32,
    date: NaiveDate,
    time: String,
}

fn required<T: Clone>(value: &Option<T>, field: &str) -> Result<T, AppError> {
    value.clone().ok_or_else(|| AppError::InvalidPayload(format!("{} is required.", field)))
}

// Enquiry: campo ausente vira {status:400, Invalid payload}
fn validate_enquiry(payload: &DirectBookingPayload) -> Result<DirectBooking, AppError> {
    Ok(DirectBooking {
        name: payload.name.clone(),
        phone: required(&payload.phone, "phone")?,
        package_id: required(&payload.package_id, "packageId")?,
        store_id: required(&payload.store_id, "storeId")?,
        date: parse_booking_date(&required(&payload.date, "date")?)?,
        time: required(&payload.time, "time")?,
    })
}

// App: cada campo ausente tem sua própria resposta {valid:false}
fn validate_app(payload: &DirectBookingPayload) -> Result<DirectBooking, AppError> {
    let phone = payload
        .phone
        .clone()
        .ok_or_else(|| AppError::rejected("Phone not found.", "Phone is required"))?;
    let package_id = payload
        .package_id
        .ok_or_else(|| AppError::rejected("Package ID not found.", "Package ID is required"))?;
    let store_id = payload
        .store_id
        .ok_or_else(|| AppError::rejected("Store ID not found.", "Store ID is required"))?;
    let (Some(date), Some(time)) = (payload.date.as_deref(), payload.time.clone()) else {
        return Err(AppError::rejected("Date or time not found.", "Date and time are required"));
    };

    Ok(DirectBooking {
        name: payload.name.clone(),
        phone,
        package_id,
        store_id,
        date: parse_booking_date(date)?,
        time,
    })
}

#[derive(Clone)]
pub struct DirectBookingService {
    storage: Arc<dyn Storage>,
    customers: CustomerService,
    bookings: BookingService,
}

impl DirectBookingService {
    pub fn new(storage: Arc<dyn Storage>, customers: CustomerService, bookings: BookingService) -> Self {
        Self { storage, customers, bookings }
    }

    /// POST /enquiry
    pub async fn enquiry(&self, payload: &DirectBookingPayload) -> Result<Booking, AppError> {
        let request = validate_enquiry(payload)?;
        self.book(request, Channel::Enquiry, BookingType::Enquiry).await
    }

    /// POST /user/book-slot
    pub async fn book_slot(&self, payload: &DirectBookingPayload) -> Result<Booking, AppError> {
        let request = validate_app(payload)?;
        self.book(request, Channel::App, BookingType::App).await
    }

    // Cliente e reserva entram juntos ou nada entra
    async fn book(&self, request: DirectBooking, channel: Channel, booking_type: BookingType) -> Result<Booking, AppError> {
        let mut tx = self.storage.begin().await?;
        let customer = self
            .customers
            .resolve(tx.as_mut(), &request.phone, request.name.as_deref(), channel)
            .await?
            .customer;

        let booking = self
            .bookings
            .materialize(
                tx.as_mut(),
                BookingRequest {
                    customer_id: customer.id,
                    store_id: request.store_id,
                    terms: BookingTerms::Package { package_id: request.package_id },
                    date: Some(request.date),
                    time: Some(request.time),
                    booking_type,
                },
            )
            .await?;

        tx.commit().await?;
        Ok(booking)
    }
}
