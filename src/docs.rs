// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::me,

        // --- Webhooks ---
        handlers::webhooks::whatsapp,
        handlers::webhooks::verify_whatsapp,
        handlers::webhooks::ivr,
        handlers::webhooks::doubletick,
        handlers::webhooks::superfone,
        handlers::webhooks::enquiry,
        handlers::webhooks::book_slot,

        // --- Bookings ---
        handlers::bookings::create_booking,
        handlers::bookings::consume_overs,
        handlers::bookings::list_bookings,
        handlers::bookings::list_bookings_by_status,
        handlers::bookings::get_booking,
        handlers::bookings::booking_logs,
        handlers::bookings::admin_consume_overs,
        handlers::bookings::admin_list_bookings,
        handlers::bookings::admin_list_store_bookings,

        // --- Catalog ---
        handlers::catalog::list_stores,
        handlers::catalog::list_packages,

        // --- Leads ---
        handlers::leads::list_stages,
        handlers::leads::create_stage,
        handlers::leads::list_sources,
        handlers::leads::create_source,
        handlers::leads::create_lead,
        handlers::leads::customer_leads,
        handlers::leads::customers_by_stage,
        handlers::leads::customers_by_source,
        handlers::leads::today_callbacks,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::delete_customer,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::EmployeeRole,
            models::auth::Employee,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Clientes e funil ---
            models::customer::CustomerType,
            models::customer::Customer,
            models::customer::Lead,
            models::customer::Tag,

            // --- Reservas ---
            models::booking::BookingType,
            models::booking::BookingStatus,
            models::booking::PackageType,
            models::booking::Store,
            models::booking::Package,
            models::booking::Booking,
            models::booking::BookingOvers,

            // --- Webhooks ---
            models::webhook::WaHook,
            models::webhook::Call,
            models::webhook::IvrPayload,
            models::webhook::DoubleTickPayload,
            models::webhook::SuperfonePayload,
            models::webhook::DirectBookingPayload,
            handlers::webhooks::Ack,

            // --- Payloads ---
            handlers::bookings::CreateBookingPayload,
            handlers::bookings::PlayedOversPayload,
            handlers::leads::TagPayload,
            handlers::leads::CreateLeadPayload,
            handlers::customers::CreateCustomerPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login de funcionários"),
        (name = "Webhooks", description = "WhatsApp, IVR, DoubleTick, Superfone e enquiry"),
        (name = "App", description = "Reserva pelo app do cliente"),
        (name = "Bookings", description = "Reservas e consumo de overs na loja"),
        (name = "Admin", description = "Visão global do admin"),
        (name = "Catalog", description = "Lojas e pacotes"),
        (name = "Leads", description = "Funil: estágios, origens e histórico"),
        (name = "Customers", description = "Cadastro de clientes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
