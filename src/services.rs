pub mod auth;
pub mod booking_service;
pub mod call_center_service;
pub mod correlation;
pub mod customer_service;
pub mod decoders;
pub mod direct_booking_service;
pub mod ivr_service;
pub mod lead_service;
pub mod outcome;
pub mod whatsapp_service;
