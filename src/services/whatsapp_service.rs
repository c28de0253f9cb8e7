// src/services/whatsapp_service.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::Storage,
    models::{
        booking::{BookingRequest, BookingTerms, BookingType},
        customer::Channel,
        webhook::{WaMessage, WhatsAppPayload},
    },
    services::{
        booking_service::BookingService,
        correlation::CorrelationStore,
        customer_service::CustomerService,
        decoders::{self, Decoded, Selection},
        outcome::{booked_or_ignored, WebhookOutcome},
    },
};

// O que cada mensagem interativa carrega
enum Interaction<'a> {
    ListReply(&'a str),
    FlowReply(&'a str),
}

fn interaction(message: &WaMessage) -> Option<Interaction<'_>> {
    if message.kind.as_deref() != Some("interactive") {
        return None;
    }
    let interactive = message.interactive.as_ref()?;

    if let Some(title) = interactive.list_reply.as_ref().and_then(|r| r.title.as_deref()) {
        return Some(Interaction::ListReply(title));
    }
    if let Some(raw) = interactive.nfm_reply.as_ref().and_then(|r| r.response_json.as_deref()) {
        return Some(Interaction::FlowReply(raw));
    }
    None
}

// Pacote do catálogo ou overs avulsos (preço combinado na loja)
fn booking_terms(selection: Selection) -> (BookingTerms, BookingType) {
    match selection {
        Selection::Package { package_id } => (BookingTerms::Package { package_id }, BookingType::Package),
        Selection::Custom { overs } => (BookingTerms::Custom { price: None, overs }, BookingType::Custom),
    }
}

#[derive(Clone)]
pub struct WhatsAppService {
    storage: Arc<dyn Storage>,
    customers: CustomerService,
    bookings: BookingService,
    correlation: CorrelationStore,
}

impl WhatsAppService {
    pub fn new(
        storage: Arc<dyn Storage>,
        customers: CustomerService,
        bookings: BookingService,
        correlation: CorrelationStore,
    ) -> Self {
        Self { storage, customers, bookings, correlation }
    }

    /// Processa uma entrega do webhook do WhatsApp numa única transação.
    ///
    /// Lista escolhida: grava a escolha e para. Formulário enviado: grava o
    /// formulário, recupera a escolha anterior do telefone e cria a reserva.
    pub async fn handle(&self, payload: &WhatsAppPayload, now: DateTime<Utc>) -> Result<WebhookOutcome, AppError> {
        let Some(value) = payload.value() else {
            return Ok(WebhookOutcome::Ignored("sem entry[0].changes[0].value".to_string()));
        };
        let Some(contact) = value.contacts.first() else {
            return Ok(WebhookOutcome::Ignored("sem contato (status de entrega?)".to_string()));
        };
        let Some(phone) = contact.wa_id.as_deref() else {
            return Ok(WebhookOutcome::Ignored("contato sem wa_id".to_string()));
        };
        let name = contact.profile.as_ref().and_then(|p| p.name.as_deref());

        let mut tx = self.storage.begin().await?;
        let customer = self.customers.resolve(tx.as_mut(), phone, name, Channel::WhatsApp).await?.customer;

        let outcome = match value.messages.first().and_then(interaction) {
            Some(Interaction::ListReply(title)) => {
                self.correlation.record_selection(tx.as_mut(), phone, customer.id, title).await?;
                tracing::info!(customer_id = customer.id, selected = title, "Escolha de pacote registrada");
                WebhookOutcome::SelectionRecorded
            }
            Some(Interaction::FlowReply(raw)) => {
                // Guarda o formulário como veio; JSON inválido fica como string
                let form: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
                tx.append_wa_hook(phone, customer.id, &form).await?;

                match decoders::decode_flow_form(&form) {
                    Decoded::Parsed(slot) => {
                        match self.correlation.find_pending_selection(tx.as_mut(), phone, now).await? {
                            None => WebhookOutcome::Ignored("nenhuma escolha de pacote pendente".to_string()),
                            Some(selected) => match decoders::classify_selection(&selected).map(booking_terms) {
                                Decoded::Parsed((terms, booking_type)) => {
                                    let request = BookingRequest {
                                        customer_id: customer.id,
                                        store_id: slot.store_id,
                                        terms,
                                        date: Some(slot.date),
                                        time: Some(slot.time),
                                        booking_type,
                                    };
                                    booked_or_ignored(self.bookings.materialize(tx.as_mut(), request).await)?
                                }
                                Decoded::Incomplete(reason) | Decoded::Unrecognized(reason) => {
                                    WebhookOutcome::Ignored(reason)
                                }
                            },
                        }
                    }
                    Decoded::Incomplete(reason) | Decoded::Unrecognized(reason) => WebhookOutcome::Ignored(reason),
                }
            }
            None => WebhookOutcome::Ignored("mensagem não interativa".to_string()),
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
