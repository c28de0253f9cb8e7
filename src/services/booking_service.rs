// src/services/booking_service.rs

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    common::error::{AppError, Entity},
    db::{BookingRepository, Storage, StorageTx},
    models::booking::{
        Booking, BookingOvers, BookingRequest, BookingStatus, BookingTerms, NewBooking, NewBookingOvers, Package,
        Store,
    },
};

/// Datas de reserva chegam como `YYYY-MM-DD`.
pub fn parse_booking_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidPayload("date must be in YYYY-MM-DD format.".to_string()))
}

#[derive(Clone)]
pub struct BookingService {
    storage: Arc<dyn Storage>,
    repo: BookingRepository,
}

impl BookingService {
    pub fn new(storage: Arc<dyn Storage>, repo: BookingRepository) -> Self {
        Self { storage, repo }
    }

    /// Grava a reserva dentro da unidade de trabalho do chamador.
    ///
    /// Loja e pacote precisam existir. Preço e overs de pacote são copiados
    /// da linha do pacote no momento da reserva.
    pub async fn materialize(&self, tx: &mut dyn StorageTx, request: BookingRequest) -> Result<Booking, AppError> {
        if tx.find_store(request.store_id).await?.is_none() {
            return Err(AppError::NotFound(Entity::Store));
        }

        let (package_id, price, overs) = match request.terms {
            BookingTerms::Package { package_id } => {
                let package = tx
                    .find_package(package_id)
                    .await?
                    .ok_or(AppError::NotFound(Entity::Package))?;
                (Some(package.id), Some(package.price), package.overs)
            }
            BookingTerms::Custom { price, overs } => {
                if price.is_some_and(|p| p < 0) {
                    return Err(AppError::InvalidPayload("price must be a positive integer.".to_string()));
                }
                (None, price, overs)
            }
        };

        if overs <= 0 {
            return Err(AppError::InvalidPayload("overs must be a positive integer.".to_string()));
        }

        let booking = tx
            .insert_booking(&NewBooking {
                customer_id: request.customer_id,
                store_id: request.store_id,
                package_id,
                booking_type: request.booking_type,
                date: request.date,
                time: request.time,
                price,
                overs,
            })
            .await?;

        tracing::info!(
            booking_id = booking.id,
            customer_id = booking.customer_id,
            store_id = booking.store_id,
            overs = booking.overs,
            "Reserva criada ({:?})",
            booking.booking_type
        );
        Ok(booking)
    }

    // POST /emp/booking: cliente informado por id
    pub async fn create_for_customer(&self, request: BookingRequest) -> Result<Booking, AppError> {
        let mut tx = self.storage.begin().await?;
        if tx.find_customer(request.customer_id).await?.is_none() {
            return Err(AppError::NotFound(Entity::Customer));
        }
        let booking = self.materialize(tx.as_mut(), request).await?;
        tx.commit().await?;
        Ok(booking)
    }

    /// Debita overs jogados e grava a auditoria.
    ///
    /// `store_id` restringe a reserva à loja do funcionário (`None` = admin).
    pub async fn consume_overs(
        &self,
        booking_id: i32,
        played_overs: i32,
        employee_id: Option<i32>,
        store_id: Option<i32>,
    ) -> Result<Booking, AppError> {
        if played_overs < 1 {
            return Err(AppError::InvalidPayload("playedOvers must be a positive integer.".to_string()));
        }

        let mut tx = self.storage.begin().await?;
        let booking = tx
            .consume_overs(booking_id, played_overs, store_id)
            .await?
            .ok_or(AppError::NotFound(Entity::Booking))?;

        tx.log_played_overs(&NewBookingOvers {
            booking_id: booking.id,
            overs: played_overs,
            employee_id,
            store_id: booking.store_id,
            customer_id: booking.customer_id,
        })
        .await?;
        tx.commit().await?;

        if booking.overs_left < 0 {
            tracing::warn!(booking_id, overs_left = booking.overs_left, "Saldo de overs negativo");
        }
        Ok(booking)
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list(&self, store_id: Option<i32>, status: Option<BookingStatus>) -> Result<Vec<Booking>, AppError> {
        self.repo.list(store_id, status).await
    }

    pub async fn find(&self, id: i32, store_id: Option<i32>) -> Result<Booking, AppError> {
        self.repo.find(id, store_id).await?.ok_or(AppError::NotFound(Entity::Booking))
    }

    pub async fn logs(&self, store_id: Option<i32>) -> Result<Vec<BookingOvers>, AppError> {
        self.repo.list_logs(store_id).await
    }

    pub async fn stores(&self) -> Result<Vec<Store>, AppError> {
        self.repo.list_stores().await
    }

    pub async fn packages(&self) -> Result<Vec<Package>, AppError> {
        self.repo.list_packages().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_support::lazy_pool,
        db::memory::MemoryStorage,
        models::booking::BookingType,
    };
    use chrono::NaiveDate;

    fn service(storage: &MemoryStorage) -> BookingService {
        BookingService::new(Arc::new(storage.clone()), BookingRepository::new(lazy_pool()))
    }

    fn request(store_id: i32, terms: BookingTerms, booking_type: BookingType) -> BookingRequest {
        BookingRequest {
            customer_id: 7,
            store_id,
            terms,
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            time: Some("Morning".into()),
            booking_type,
        }
    }

    async fn materialize(storage: &MemoryStorage, req: BookingRequest) -> Result<Booking, AppError> {
        let bookings = service(storage);
        let mut tx = storage.begin().await.unwrap();
        let result = bookings.materialize(tx.as_mut(), req).await;
        tx.commit().await.unwrap();
        result
    }

    #[tokio::test]
    async fn package_booking_snapshots_price_and_overs() {
        let storage = MemoryStorage::seeded();
        let booking = materialize(&storage, request(2, BookingTerms::Package { package_id: 3 }, BookingType::Package))
            .await
            .unwrap();

        assert_eq!(booking.package_id, Some(3));
        assert_eq!(booking.price, Some(1000));
        assert_eq!(booking.overs, 20);
        assert_eq!(booking.overs_left, booking.overs);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.booking_type, BookingType::Package);
    }

    #[tokio::test]
    async fn custom_booking_starts_with_full_balance() {
        let storage = MemoryStorage::seeded();
        let booking = materialize(
            &storage,
            request(1, BookingTerms::Custom { price: None, overs: 30 }, BookingType::Custom),
        )
        .await
        .unwrap();

        assert_eq!(booking.package_id, None);
        assert_eq!(booking.price, None);
        assert_eq!(booking.overs_left, 30);
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn referential_misses_and_empty_overs_are_rejected() {
        let storage = MemoryStorage::seeded();

        let unknown_store = materialize(&storage, request(9, BookingTerms::Package { package_id: 1 }, BookingType::Package))
            .await
            .unwrap_err();
        assert!(matches!(unknown_store, AppError::NotFound(Entity::Store)));

        let unknown_package =
            materialize(&storage, request(1, BookingTerms::Package { package_id: 99 }, BookingType::Package))
                .await
                .unwrap_err();
        assert!(matches!(unknown_package, AppError::NotFound(Entity::Package)));

        let zero_overs = materialize(&storage, request(1, BookingTerms::Custom { price: None, overs: 0 }, BookingType::Custom))
            .await
            .unwrap_err();
        assert!(matches!(zero_overs, AppError::InvalidPayload(_)));

        assert!(storage.snapshot().bookings.is_empty());
    }

    #[tokio::test]
    async fn decrement_to_exactly_zero_completes_the_booking() {
        let storage = MemoryStorage::seeded();
        let bookings = service(&storage);
        let booking = storage.seed_booking(7, 1, 10);

        let partial = bookings.consume_overs(booking.id, 4, Some(11), Some(1)).await.unwrap();
        assert_eq!(partial.overs_left, 6);
        assert_eq!(partial.status, BookingStatus::Pending);
        assert!(partial.last_played_date.is_some());

        let done = bookings.consume_overs(booking.id, 6, Some(11), Some(1)).await.unwrap();
        assert_eq!(done.overs_left, 0);
        assert_eq!(done.status, BookingStatus::Completed);

        let logs = storage.snapshot().booking_overs;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs.iter().map(|l| l.overs).sum::<i32>(), 10);
        assert!(logs.iter().all(|l| l.employee_id == Some(11) && l.customer_id == 7 && l.store_id == 1));
    }

    #[tokio::test]
    async fn overdraw_goes_negative_and_stays_pending() {
        let storage = MemoryStorage::seeded();
        let bookings = service(&storage);
        let booking = storage.seed_booking(7, 1, 5);

        let overdrawn = bookings.consume_overs(booking.id, 8, None, None).await.unwrap();
        assert_eq!(overdrawn.overs_left, -3);
        assert_eq!(overdrawn.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn store_scope_hides_other_stores_bookings() {
        let storage = MemoryStorage::seeded();
        let bookings = service(&storage);
        let booking = storage.seed_booking(7, 2, 5);

        let err = bookings.consume_overs(booking.id, 1, Some(11), Some(1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Entity::Booking)));

        let invalid = bookings.consume_overs(booking.id, 0, Some(11), Some(2)).await.unwrap_err();
        assert!(matches!(invalid, AppError::InvalidPayload(_)));

        let state = storage.snapshot();
        assert_eq!(state.bookings[0].overs_left, 5);
        assert!(state.booking_overs.is_empty());
    }
}
