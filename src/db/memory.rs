// src/db/memory.rs
//
// Implementação em memória do `Storage`, usada só nos testes.
// Uma transação trabalha numa cópia do estado; o `commit` grava a cópia de volta.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    common::error::AppError,
    db::storage::{Storage, StorageTx},
    models::{
        booking::{
            Booking, BookingOvers, BookingStatus, BookingType, NewBooking, NewBookingOvers, Package, PackageType,
            Store,
        },
        customer::{Customer, Lead, NewCustomer, NewLead, TagKind},
        webhook::{Call, NewCall, WaHook},
    },
};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub customers: Vec<Customer>,
    pub leads: Vec<Lead>,
    pub stages: Vec<String>,
    pub sources: Vec<String>,
    pub stores: Vec<Store>,
    pub packages: Vec<Package>,
    pub bookings: Vec<Booking>,
    pub booking_overs: Vec<BookingOvers>,
    pub wa_hooks: Vec<WaHook>,
    pub calls: Vec<Call>,
    next_id: i32,
    // Simula o banco fora do ar
    failing: bool,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// Lojas 1..3 e pacotes 1..4, iguais aos da migração inicial.
    pub fn seeded() -> Self {
        let storage = Self::default();
        {
            let mut state = storage.lock();
            let now = Utc::now();
            for (id, name) in [
                (1, "StrikeTheBall - Sector 104"),
                (2, "StrikeTheBall - Sector 93"),
                (3, "StrikeTheBall - Sector 45"),
            ] {
                state.stores.push(Store {
                    id,
                    name: name.to_string(),
                    address: String::new(),
                    phone: String::new(),
                    store_location: None,
                    created_at: now,
                    updated_at: now,
                });
            }
            for (id, price, overs) in [(1, 300, 5), (2, 500, 10), (3, 1000, 20), (4, 1500, 40)] {
                state.packages.push(Package {
                    id,
                    name: format!("{} Overs", overs),
                    title: Some(format!("{} Overs - {} INR", overs, price)),
                    description: None,
                    price,
                    overs,
                    package_type: PackageType::Package,
                    created_at: now,
                    updated_at: now,
                });
            }
            state.next_id = 100;
        }
        storage
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> MemoryState {
        self.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Grava uma interação do WhatsApp com horário explícito.
    pub fn seed_wa_hook(&self, phone: &str, customer_id: i32, response: Value, created_at: DateTime<Utc>) -> i32 {
        let mut state = self.lock();
        let id = state.next_id();
        state.wa_hooks.push(WaHook {
            id,
            phone: phone.to_string(),
            customer_id,
            response,
            created_at,
        });
        id
    }

    pub fn seed_booking(&self, customer_id: i32, store_id: i32, overs: i32) -> Booking {
        let mut state = self.lock();
        let id = state.next_id();
        let now = Utc::now();
        let booking = Booking {
            id,
            customer_id,
            store_id,
            package_id: None,
            booking_type: BookingType::Custom,
            date: None,
            time: None,
            price: None,
            overs,
            overs_left: overs,
            status: BookingStatus::Pending,
            paid: false,
            last_played_date: None,
            created_at: now,
            updated_at: now,
        };
        state.bookings.push(booking.clone());
        booking
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn begin(&self) -> Result<Box<dyn StorageTx>, AppError> {
        let state = self.lock().clone();
        state.check()?;
        Ok(Box::new(MemoryTx { shared: self.state.clone(), state }))
    }
}

pub struct MemoryTx {
    shared: Arc<Mutex<MemoryState>>,
    state: MemoryState,
}

#[async_trait]
impl StorageTx for MemoryTx {
    async fn find_customer_by_phone(&mut self, phone: &str) -> Result<Option<Customer>, AppError> {
        self.state.check()?;
        Ok(self.state.customers.iter().find(|c| c.phone == phone).cloned())
    }

    async fn find_customer(&mut self, id: i32) -> Result<Option<Customer>, AppError> {
        self.state.check()?;
        Ok(self.state.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_customer_if_absent(&mut self, customer: &NewCustomer) -> Result<Option<Customer>, AppError> {
        self.state.check()?;
        if self.state.customers.iter().any(|c| c.phone == customer.phone) {
            return Ok(None);
        }
        let now = Utc::now();
        let created = Customer {
            id: self.state.next_id(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            customer_type: customer.customer_type,
            created_at: now,
            updated_at: now,
        };
        self.state.customers.push(created.clone());
        Ok(Some(created))
    }

    async fn create_lead(&mut self, lead: &NewLead) -> Result<Lead, AppError> {
        self.state.check()?;
        let now = Utc::now();
        let created = Lead {
            id: self.state.next_id(),
            customer_id: lead.customer_id,
            stage: lead.stage.clone(),
            source: lead.source.clone(),
            comments: lead.comments.clone(),
            store_id: lead.store_id,
            callback_date: lead.callback_date,
            staff_name: lead.staff_name.clone(),
            staff_phone: lead.staff_phone.clone(),
            call_time: lead.call_time.clone(),
            call_duration: lead.call_duration,
            created_at: now,
            updated_at: now,
        };
        self.state.leads.push(created.clone());
        Ok(created)
    }

    async fn register_tag(&mut self, kind: TagKind, name: &str) -> Result<(), AppError> {
        self.state.check()?;
        let tags = match kind {
            TagKind::Stage => &mut self.state.stages,
            TagKind::Source => &mut self.state.sources,
        };
        if !tags.iter().any(|t| t == name) {
            tags.push(name.to_string());
        }
        Ok(())
    }

    async fn append_wa_hook(&mut self, phone: &str, customer_id: i32, response: &Value) -> Result<WaHook, AppError> {
        self.state.check()?;
        let hook = WaHook {
            id: self.state.next_id(),
            phone: phone.to_string(),
            customer_id,
            response: response.clone(),
            created_at: Utc::now(),
        };
        self.state.wa_hooks.push(hook.clone());
        Ok(hook)
    }

    async fn latest_selection(
        &mut self,
        phone: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<WaHook>, AppError> {
        self.state.check()?;
        Ok(self
            .state
            .wa_hooks
            .iter()
            .filter(|h| h.phone == phone)
            .filter(|h| h.selected().is_some_and(|s| s.contains("Overs")))
            .filter(|h| since.is_none_or(|cutoff| h.created_at >= cutoff))
            .max_by_key(|h| (h.created_at, h.id))
            .cloned())
    }

    async fn create_call(&mut self, call: &NewCall) -> Result<Call, AppError> {
        self.state.check()?;
        let created = Call {
            id: self.state.next_id(),
            call_id: call.call_id.clone(),
            caller_no: call.caller_no.clone(),
            called_no: call.called_no.clone(),
            start_time: call.start_time.clone(),
            end_time: call.end_time.clone(),
            duration: call.duration,
            customer_id: call.customer_id,
            created_at: Utc::now(),
        };
        self.state.calls.push(created.clone());
        Ok(created)
    }

    async fn find_store(&mut self, id: i32) -> Result<Option<Store>, AppError> {
        self.state.check()?;
        Ok(self.state.stores.iter().find(|s| s.id == id).cloned())
    }

    async fn find_package(&mut self, id: i32) -> Result<Option<Package>, AppError> {
        self.state.check()?;
        Ok(self.state.packages.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, AppError> {
        self.state.check()?;
        let now = Utc::now();
        let created = Booking {
            id: self.state.next_id(),
            customer_id: booking.customer_id,
            store_id: booking.store_id,
            package_id: booking.package_id,
            booking_type: booking.booking_type,
            date: booking.date,
            time: booking.time.clone(),
            price: booking.price,
            overs: booking.overs,
            overs_left: booking.overs,
            status: BookingStatus::Pending,
            paid: false,
            last_played_date: None,
            created_at: now,
            updated_at: now,
        };
        self.state.bookings.push(created.clone());
        Ok(created)
    }

    async fn consume_overs(
        &mut self,
        booking_id: i32,
        played_overs: i32,
        store_id: Option<i32>,
    ) -> Result<Option<Booking>, AppError> {
        self.state.check()?;
        let Some(booking) = self
            .state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && store_id.is_none_or(|s| b.store_id == s))
        else {
            return Ok(None);
        };
        booking.overs_left -= played_overs;
        if booking.overs_left == 0 {
            booking.status = BookingStatus::Completed;
        }
        booking.last_played_date = Some(Utc::now());
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }

    async fn log_played_overs(&mut self, log: &NewBookingOvers) -> Result<BookingOvers, AppError> {
        self.state.check()?;
        let entry = BookingOvers {
            id: self.state.next_id(),
            booking_id: log.booking_id,
            overs: log.overs,
            employee_id: log.employee_id,
            store_id: log.store_id,
            customer_id: log.customer_id,
            created_at: Utc::now(),
        };
        self.state.booking_overs.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.state.check()?;
        let MemoryTx { shared, state } = *self;
        // Contador de ids continua de onde a transação parou
        *shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
        Ok(())
    }
}
