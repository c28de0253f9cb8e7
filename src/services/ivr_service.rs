// src/services/ivr_service.rs

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    common::error::AppError,
    db::Storage,
    models::{
        booking::{BookingRequest, BookingTerms, BookingType},
        customer::Channel,
        webhook::{IvrPayload, NewCall},
    },
    services::{
        booking_service::BookingService,
        customer_service::CustomerService,
        decoders::{self, Decoded},
        outcome::{booked_or_ignored, WebhookOutcome},
    },
};

#[derive(Clone)]
pub struct IvrService {
    storage: Arc<dyn Storage>,
    customers: CustomerService,
    bookings: BookingService,
    country_code: String,
}

impl IvrService {
    pub fn new(
        storage: Arc<dyn Storage>,
        customers: CustomerService,
        bookings: BookingService,
        country_code: String,
    ) -> Self {
        Self { storage, customers, bookings, country_code }
    }

    /// Número do cliente como o IVR o identifica: código do país + número do chamador.
    pub fn normalize_phone(&self, caller_no: &str) -> String {
        format!("{}{}", self.country_code, caller_no.trim())
    }

    /// Registra a ligação e, se as teclas formam um pedido completo, a reserva.
    ///
    /// `today` é a data do processamento; as opções "hoje/amanhã" partem dela.
    pub async fn handle(&self, payload: &IvrPayload, today: NaiveDate) -> Result<WebhookOutcome, AppError> {
        let Some(caller_no) = payload.caller_no.as_deref() else {
            return Ok(WebhookOutcome::Ignored("sem caller_no".to_string()));
        };
        let phone = self.normalize_phone(caller_no);

        let mut tx = self.storage.begin().await?;
        let customer = self.customers.resolve(tx.as_mut(), &phone, None, Channel::Ivr).await?.customer;

        tx.create_call(&NewCall {
            call_id: payload.call_id.clone().unwrap_or_default(),
            caller_no: caller_no.to_string(),
            called_no: payload.called_no.clone(),
            start_time: payload.call_start_time.clone(),
            end_time: payload.call_end_time.clone(),
            duration: payload.duration,
            customer_id: customer.id,
        })
        .await?;

        let outcome = match decoders::decode_keypress(payload.keypress.as_deref().unwrap_or_default(), today) {
            Decoded::Parsed(selection) => {
                let request = BookingRequest {
                    customer_id: customer.id,
                    store_id: selection.store_id,
                    terms: BookingTerms::Custom { price: None, overs: selection.overs },
                    date: Some(selection.date),
                    time: Some(selection.time.to_string()),
                    booking_type: BookingType::Custom,
                };
                booked_or_ignored(self.bookings.materialize(tx.as_mut(), request).await)?
            }
            Decoded::Incomplete(reason) | Decoded::Unrecognized(reason) => WebhookOutcome::Ignored(reason),
        };

        tx.commit().await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_support::lazy_pool,
        db::{memory::MemoryStorage, BookingRepository, CustomerRepository},
        models::customer::CustomerType,
    };
    use serde_json::json;

    fn service(storage: &MemoryStorage) -> IvrService {
        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        IvrService::new(
            shared.clone(),
            CustomerService::new(shared.clone(), CustomerRepository::new(lazy_pool())),
            BookingService::new(shared.clone(), BookingRepository::new(lazy_pool())),
            "91".to_string(),
        )
    }

    fn payload(keypress: &str) -> IvrPayload {
        serde_json::from_value(json!({
            "call_id": "c-1029",
            "caller_no": 9900011122u64,
            "called_no": "8045000000",
            "call_start_time": "2024-05-01 10:00:00",
            "call_end_time": "2024-05-01 10:02:10",
            "duration": "130",
            "keypress": keypress
        }))
        .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[tokio::test]
    async fn full_keypress_creates_customer_call_and_custom_booking() {
        let storage = MemoryStorage::seeded();
        let outcome = service(&storage).handle(&payload("1-DG-2-DG-3-DG-1-DG-2"), today()).await.unwrap();

        let booking = outcome.booking().expect("deveria reservar");
        assert_eq!(booking.store_id, 2);
        assert_eq!(booking.overs, 30);
        assert_eq!(booking.overs_left, 30);
        assert_eq!(booking.date, Some(today()));
        assert_eq!(booking.time.as_deref(), Some("Afternoon"));
        assert_eq!(booking.booking_type, BookingType::Custom);

        let state = storage.snapshot();
        assert_eq!(state.customers.len(), 1);
        assert_eq!(state.customers[0].phone, "919900011122");
        assert_eq!(state.customers[0].customer_type, CustomerType::Ivr);
        assert_eq!(state.customers[0].name, None);
        assert_eq!(state.leads.len(), 1);
        assert_eq!(state.leads[0].source.as_deref(), Some("IVR"));
        assert_eq!(state.calls.len(), 1);
        assert_eq!(state.calls[0].call_id, "c-1029");
        assert_eq!(state.calls[0].caller_no, "9900011122");
        assert_eq!(state.calls[0].duration, Some(130));
    }

    #[tokio::test]
    async fn bad_digit_records_the_call_but_books_nothing() {
        let storage = MemoryStorage::seeded();
        let outcome = service(&storage).handle(&payload("1-DG-7-DG-3-DG-1-DG-2"), today()).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
        let state = storage.snapshot();
        assert_eq!(state.calls.len(), 1);
        assert!(state.bookings.is_empty());
    }

    #[tokio::test]
    async fn custom_tier_is_rejected_downstream() {
        let storage = MemoryStorage::seeded();
        let outcome = service(&storage).handle(&payload("1-DG-1-DG-5-DG-2-DG-1"), today()).await.unwrap();

        assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
        assert!(storage.snapshot().bookings.is_empty());
    }

    #[tokio::test]
    async fn repeat_caller_reuses_the_customer() {
        let storage = MemoryStorage::seeded();
        let ivr = service(&storage);
        ivr.handle(&payload("1-DG-2-DG-3-DG-1-DG-2"), today()).await.unwrap();
        ivr.handle(&payload("1-DG-1-DG-1-DG-3-DG-3"), today()).await.unwrap();

        let state = storage.snapshot();
        assert_eq!(state.customers.len(), 1);
        assert_eq!(state.leads.len(), 1);
        assert_eq!(state.calls.len(), 2);
        assert_eq!(state.bookings.len(), 2);
    }

    #[tokio::test]
    async fn payload_without_caller_is_ignored() {
        let storage = MemoryStorage::seeded();
        let outcome = service(&storage).handle(&IvrPayload::default(), today()).await.unwrap();
        assert!(matches!(outcome, WebhookOutcome::Ignored(_)));
        assert!(storage.snapshot().customers.is_empty());
    }
}
