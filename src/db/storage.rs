// src/db/storage.rs
//
// Unidade de trabalho usada pelos adaptadores de canal e pelas mutações da API.
// Cada entrega de webhook abre uma transação, faz todas as escritas por ela e
// só então confirma. Soltar a transação sem `commit` desfaz tudo.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::error::AppError,
    db::{BookingRepository, CustomerRepository, LeadRepository, WebhookRepository},
    models::{
        booking::{Booking, BookingOvers, NewBooking, NewBookingOvers, Package, Store},
        customer::{Customer, Lead, NewCustomer, NewLead, TagKind},
        webhook::{Call, NewCall, WaHook},
    },
};

#[async_trait]
pub trait Storage: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StorageTx>, AppError>;
}

#[async_trait]
pub trait StorageTx: Send {
    // --- Clientes e funil ---
    async fn find_customer_by_phone(&mut self, phone: &str) -> Result<Option<Customer>, AppError>;
    async fn find_customer(&mut self, id: i32) -> Result<Option<Customer>, AppError>;
    /// `None` quando o telefone já pertence a outro cliente.
    async fn insert_customer_if_absent(&mut self, customer: &NewCustomer) -> Result<Option<Customer>, AppError>;
    async fn create_lead(&mut self, lead: &NewLead) -> Result<Lead, AppError>;
    async fn register_tag(&mut self, kind: TagKind, name: &str) -> Result<(), AppError>;

    // --- Log do WhatsApp e chamadas ---
    async fn append_wa_hook(&mut self, phone: &str, customer_id: i32, response: &Value) -> Result<WaHook, AppError>;
    async fn latest_selection(
        &mut self,
        phone: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<WaHook>, AppError>;
    async fn create_call(&mut self, call: &NewCall) -> Result<Call, AppError>;

    // --- Reservas ---
    async fn find_store(&mut self, id: i32) -> Result<Option<Store>, AppError>;
    async fn find_package(&mut self, id: i32) -> Result<Option<Package>, AppError>;
    async fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, AppError>;
    async fn consume_overs(
        &mut self,
        booking_id: i32,
        played_overs: i32,
        store_id: Option<i32>,
    ) -> Result<Option<Booking>, AppError>;
    async fn log_played_overs(&mut self, log: &NewBookingOvers) -> Result<BookingOvers, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

// =============================================================================
//  POSTGRES
// =============================================================================

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
    customers: CustomerRepository,
    leads: LeadRepository,
    bookings: BookingRepository,
    webhooks: WebhookRepository,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool.clone()),
            leads: LeadRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            webhooks: WebhookRepository::new(),
            pool,
        }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn begin(&self) -> Result<Box<dyn StorageTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStorageTx {
            tx,
            customers: self.customers.clone(),
            leads: self.leads.clone(),
            bookings: self.bookings.clone(),
            webhooks: self.webhooks.clone(),
        }))
    }
}

pub struct PgStorageTx {
    tx: Transaction<'static, Postgres>,
    customers: CustomerRepository,
    leads: LeadRepository,
    bookings: BookingRepository,
    webhooks: WebhookRepository,
}

#[async_trait]
impl StorageTx for PgStorageTx {
    async fn find_customer_by_phone(&mut self, phone: &str) -> Result<Option<Customer>, AppError> {
        self.customers.find_by_phone(&mut *self.tx, phone).await
    }

    async fn find_customer(&mut self, id: i32) -> Result<Option<Customer>, AppError> {
        self.customers.find_by_id(&mut *self.tx, id).await
    }

    async fn insert_customer_if_absent(&mut self, customer: &NewCustomer) -> Result<Option<Customer>, AppError> {
        self.customers.insert_if_absent(&mut *self.tx, customer).await
    }

    async fn create_lead(&mut self, lead: &NewLead) -> Result<Lead, AppError> {
        self.leads.create(&mut *self.tx, lead).await
    }

    async fn register_tag(&mut self, kind: TagKind, name: &str) -> Result<(), AppError> {
        self.leads.register_tag(&mut *self.tx, kind, name).await
    }

    async fn append_wa_hook(&mut self, phone: &str, customer_id: i32, response: &Value) -> Result<WaHook, AppError> {
        self.webhooks.append_wa_hook(&mut *self.tx, phone, customer_id, response).await
    }

    async fn latest_selection(
        &mut self,
        phone: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<WaHook>, AppError> {
        self.webhooks.latest_selection(&mut *self.tx, phone, since).await
    }

    async fn create_call(&mut self, call: &NewCall) -> Result<Call, AppError> {
        self.webhooks.create_call(&mut *self.tx, call).await
    }

    async fn find_store(&mut self, id: i32) -> Result<Option<Store>, AppError> {
        self.bookings.find_store(&mut *self.tx, id).await
    }

    async fn find_package(&mut self, id: i32) -> Result<Option<Package>, AppError> {
        self.bookings.find_package(&mut *self.tx, id).await
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, AppError> {
        self.bookings.insert(&mut *self.tx, booking).await
    }

    async fn consume_overs(
        &mut self,
        booking_id: i32,
        played_overs: i32,
        store_id: Option<i32>,
    ) -> Result<Option<Booking>, AppError> {
        self.bookings
            .consume_overs(&mut *self.tx, booking_id, played_overs, store_id)
            .await
    }

    async fn log_played_overs(&mut self, log: &NewBookingOvers) -> Result<BookingOvers, AppError> {
        self.bookings.log_played_overs(&mut *self.tx, log).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
