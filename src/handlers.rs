pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod customers;
pub mod leads;
pub mod webhooks;
