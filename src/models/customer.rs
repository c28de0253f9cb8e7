// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// --- ENUMS ---

// Mapeia o CREATE TYPE customer_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "customer_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerType {
    Normal,
    Wa,
    Ivr,
    Enquiry,
    App,
    Superfone,
    Guest,
}

/// Canal externo de onde veio a interação.
///
/// Cada canal define a etiqueta gravada no cliente (`customer_type`) e a
/// origem (`source`) do lead aberto na primeira vez que o telefone aparece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    WhatsApp,
    Ivr,
    Superfone,
    DoubleTick,
    Enquiry,
    App,
}

impl Channel {
    pub fn customer_type(self) -> CustomerType {
        match self {
            Channel::WhatsApp | Channel::DoubleTick => CustomerType::Wa,
            Channel::Ivr => CustomerType::Ivr,
            Channel::Superfone => CustomerType::Superfone,
            Channel::Enquiry => CustomerType::Enquiry,
            Channel::App => CustomerType::App,
        }
    }

    pub fn lead_source(self) -> &'static str {
        match self {
            Channel::WhatsApp => "WhatsApp",
            Channel::Ivr => "IVR",
            Channel::Superfone => "Superfone",
            Channel::DoubleTick => "DoubleTick",
            Channel::Enquiry => "ENQUIRY",
            Channel::App => "APP",
        }
    }
}

// Estágio inicial de todo lead aberto por um adaptador
pub const NEW_LEAD_STAGE: &str = "New";

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Rahul")]
    pub name: Option<String>,
    #[schema(example = "919900011122")]
    pub phone: String,
    pub email: Option<String>,
    pub customer_type: CustomerType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub customer_type: CustomerType,
}

// --- FUNIL ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i32,
    pub customer_id: i32,
    #[schema(example = "New")]
    pub stage: String,
    #[schema(example = "WhatsApp")]
    pub source: Option<String>,
    pub comments: Option<String>,
    pub store_id: Option<i32>,
    pub callback_date: Option<DateTime<Utc>>,

    // Atribuição de atendimento (canais de telefonia)
    pub staff_name: Option<String>,
    pub staff_phone: Option<String>,
    pub call_time: Option<String>,
    pub call_duration: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLead {
    pub customer_id: i32,
    pub stage: String,
    pub source: Option<String>,
    pub comments: Option<String>,
    pub store_id: Option<i32>,
    pub callback_date: Option<DateTime<Utc>>,
    pub staff_name: Option<String>,
    pub staff_phone: Option<String>,
    pub call_time: Option<String>,
    pub call_duration: Option<i32>,
}

impl NewLead {
    /// Lead de aquisição: aberto quando um canal cria o cliente.
    pub fn acquisition(customer_id: i32, channel: Channel) -> Self {
        Self {
            customer_id,
            stage: NEW_LEAD_STAGE.to_string(),
            source: Some(channel.lead_source().to_string()),
            ..Default::default()
        }
    }
}

// Vocabulários abertos (Stage / Source): mesma forma, tabelas diferentes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i32,
    #[schema(example = "Interested")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Stage,
    Source,
}
