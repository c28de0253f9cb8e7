// src/models/webhook.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::lenient;

// =============================================================================
//  REGISTROS PERSISTIDOS
// =============================================================================

// Uma interação recebida do WhatsApp. Só é inserida e consultada por recência.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WaHook {
    pub id: i32,
    pub phone: String,
    pub customer_id: i32,
    #[schema(value_type = Object)]
    pub response: Value,
    pub created_at: DateTime<Utc>,
}

impl WaHook {
    /// Texto da seleção de pacote/overs gravado por uma resposta de lista.
    pub fn selected(&self) -> Option<&str> {
        self.response.get("selected").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: i32,
    pub call_id: String,
    pub caller_no: String,
    pub called_no: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<i32>,
    pub customer_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCall {
    pub call_id: String,
    pub caller_no: String,
    pub called_no: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<i32>,
    pub customer_id: i32,
}

// =============================================================================
//  WHATSAPP BUSINESS (POST /webhook)
// =============================================================================
// Só os campos que usamos. Todo o resto do envelope é ignorado.

#[derive(Debug, Default, Deserialize)]
pub struct WhatsAppPayload {
    #[serde(default)]
    pub entry: Vec<WaEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaEntry {
    #[serde(default)]
    pub changes: Vec<WaChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaChange {
    #[serde(default)]
    pub value: WaValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaValue {
    #[serde(default)]
    pub contacts: Vec<WaContact>,
    #[serde(default)]
    pub messages: Vec<WaMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaContact {
    #[serde(default, deserialize_with = "lenient::string")]
    pub wa_id: Option<String>,
    pub profile: Option<WaProfile>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaProfile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaMessage {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub interactive: Option<WaInteractive>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaInteractive {
    pub list_reply: Option<WaListReply>,
    pub nfm_reply: Option<WaFlowReply>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaListReply {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaFlowReply {
    // String com JSON dentro (contrato do WhatsApp Flows)
    pub response_json: Option<String>,
}

impl WhatsAppPayload {
    /// `entry[0].changes[0].value`, quando existir.
    pub fn value(&self) -> Option<&WaValue> {
        self.entry.first()?.changes.first().map(|change| &change.value)
    }
}

// =============================================================================
//  IVR (POST /ivrhook)
// =============================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct IvrPayload {
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "c-1029")]
    pub call_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "9900011122")]
    pub caller_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub called_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub call_start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub call_end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub duration: Option<i32>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "1-DG-2-DG-3-DG-1-DG-2")]
    pub keypress: Option<String>,
}

// =============================================================================
//  CALL CENTER (POST /doubletickhook, POST /superfonehook)
// =============================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoubleTickPayload {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub conversation_opened: bool,
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "Interested")]
    pub tag_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub tag_added: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub tag_removed: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SuperfonePayload {
    #[serde(default, deserialize_with = "lenient::string")]
    pub call_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub caller_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub called_no: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub call_start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub call_end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub duration: Option<i32>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub staff_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub staff_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "Callback")]
    pub lead_stage: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub comments: Option<String>,
}

// =============================================================================
//  RESERVA DIRETA (POST /enquiry, POST /user/book-slot)
// =============================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectBookingPayload {
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "Rahul")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "919900011122")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::int")]
    #[schema(example = 2)]
    pub package_id: Option<i32>,
    #[serde(default, deserialize_with = "lenient::int")]
    #[schema(example = 1)]
    pub store_id: Option<i32>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "2024-05-01")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "Evening")]
    pub time: Option<String>,
}
