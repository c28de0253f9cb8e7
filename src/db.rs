pub mod booking_repo;
pub mod customer_repo;
pub mod employee_repo;
pub mod lead_repo;
pub mod storage;
pub mod webhook_repo;

#[cfg(test)]
pub mod memory;

pub use booking_repo::BookingRepository;
pub use customer_repo::CustomerRepository;
pub use employee_repo::EmployeeRepository;
pub use lead_repo::LeadRepository;
pub use storage::{PgStorage, Storage, StorageTx};
pub use webhook_repo::WebhookRepository;
