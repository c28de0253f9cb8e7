// src/models/booking.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_type", rename_all = "PascalCase")]
pub enum BookingType {
    Package,
    Custom,
    Enquiry,
    App,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "package_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageType {
    Individual,
    Package,
    Subscription,
}

// --- Dados de referência ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "StrikeTheBall - Sector 93")]
    pub name: String,
    pub address: String,
    pub phone: String,
    pub store_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "10 Overs")]
    pub name: String,
    #[schema(example = "10 Overs - 500 INR")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = 500)]
    pub price: i32,
    #[schema(example = 10)]
    pub overs: i32,
    pub package_type: PackageType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Reserva ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i32,
    pub customer_id: i32,
    pub store_id: i32,
    pub package_id: Option<i32>,
    pub booking_type: BookingType,
    #[schema(value_type = Option<String>, format = Date, example = "2024-05-01")]
    pub date: Option<NaiveDate>,
    #[schema(example = "Morning")]
    pub time: Option<String>,
    pub price: Option<i32>,
    pub overs: i32,
    pub overs_left: i32,
    pub status: BookingStatus,
    pub paid: bool,
    pub last_played_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// O que a reserva concede: um pacote do catálogo ou um par (preço, overs) avulso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingTerms {
    Package { package_id: i32 },
    Custom { price: Option<i32>, overs: i32 },
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub customer_id: i32,
    pub store_id: i32,
    pub terms: BookingTerms,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub booking_type: BookingType,
}

// Linha pronta para INSERT (preço/overs já resolvidos)
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: i32,
    pub store_id: i32,
    pub package_id: Option<i32>,
    pub booking_type: BookingType,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub price: Option<i32>,
    pub overs: i32,
}

// Auditoria de consumo de overs
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingOvers {
    pub id: i32,
    pub booking_id: i32,
    pub overs: i32,
    pub employee_id: Option<i32>,
    pub store_id: i32,
    pub customer_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBookingOvers {
    pub booking_id: i32,
    pub overs: i32,
    pub employee_id: Option<i32>,
    pub store_id: i32,
    pub customer_id: i32,
}
