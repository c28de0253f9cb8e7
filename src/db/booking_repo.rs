// src/db/booking_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::booking::{Booking, BookingOvers, BookingStatus, NewBooking, NewBookingOvers, Package, Store},
};

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  DADOS DE REFERÊNCIA (lojas e pacotes)
    // =========================================================================

    pub async fn find_store<'e, E>(&self, executor: E, id: i32) -> Result<Option<Store>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let store = sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(store)
    }

    pub async fn find_package<'e, E>(&self, executor: E, id: i32) -> Result<Option<Package>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let package = sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(package)
    }

    pub async fn list_stores(&self) -> Result<Vec<Store>, AppError> {
        let stores = sqlx::query_as::<_, Store>("SELECT * FROM stores ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(stores)
    }

    pub async fn list_packages(&self) -> Result<Vec<Package>, AppError> {
        let packages = sqlx::query_as::<_, Package>("SELECT * FROM packages ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(packages)
    }

    // =========================================================================
    //  RESERVAS
    // =========================================================================

    /// Grava a reserva com o saldo cheio (`overs_left = overs`) e status PENDING.
    pub async fn insert<'e, E>(&self, executor: E, booking: &NewBooking) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                customer_id, store_id, package_id, booking_type,
                date, time, price, overs, overs_left, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(booking.customer_id)
        .bind(booking.store_id)
        .bind(booking.package_id)
        .bind(booking.booking_type)
        .bind(booking.date)
        .bind(&booking.time)
        .bind(booking.price)
        .bind(booking.overs)
        .fetch_one(executor)
        .await?;
        Ok(booking)
    }

    /// Busca por id. Com `store_id`, só enxerga reservas daquela loja.
    pub async fn find(&self, id: i32, store_id: Option<i32>) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE id = $1 AND ($2::INT IS NULL OR store_id = $2)",
        )
        .bind(id)
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    /// Debita overs jogados num único UPDATE.
    ///
    /// O status vira COMPLETED exatamente quando o saldo resultante é zero.
    /// Saldo negativo é aceito e mantém o status atual.
    pub async fn consume_overs<'e, E>(
        &self,
        executor: E,
        id: i32,
        played_overs: i32,
        store_id: Option<i32>,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET overs_left = overs_left - $2,
                status = CASE
                    WHEN overs_left - $2 = 0 THEN 'COMPLETED'::booking_status
                    ELSE status
                END,
                last_played_date = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND ($3::INT IS NULL OR store_id = $3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(played_overs)
        .bind(store_id)
        .fetch_optional(executor)
        .await?;
        Ok(booking)
    }

    pub async fn log_played_overs<'e, E>(&self, executor: E, log: &NewBookingOvers) -> Result<BookingOvers, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, BookingOvers>(
            r#"
            INSERT INTO booking_overs (booking_id, overs, employee_id, store_id, customer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(log.booking_id)
        .bind(log.overs)
        .bind(log.employee_id)
        .bind(log.store_id)
        .bind(log.customer_id)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    // Mais recentes primeiro; filtros opcionais por loja e status
    pub async fn list(
        &self,
        store_id: Option<i32>,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE ($1::INT IS NULL OR store_id = $1)
              AND ($2::booking_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(store_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    pub async fn list_logs(&self, store_id: Option<i32>) -> Result<Vec<BookingOvers>, AppError> {
        let logs = sqlx::query_as::<_, BookingOvers>(
            r#"
            SELECT * FROM booking_overs
            WHERE ($1::INT IS NULL OR store_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
