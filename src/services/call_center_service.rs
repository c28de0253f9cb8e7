// src/services/call_center_service.rs
//
// Webhooks da central de atendimento: etiquetas do DoubleTick e
// ligações do Superfone com atribuição do atendente.

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::Storage,
    models::{
        customer::{Channel, NewLead},
        webhook::{DoubleTickPayload, NewCall, SuperfonePayload},
    },
    services::{customer_service::CustomerService, lead_service::LeadService, outcome::WebhookOutcome},
};

#[derive(Clone)]
pub struct CallCenterService {
    storage: Arc<dyn Storage>,
    customers: CustomerService,
    leads: LeadService,
}

impl CallCenterService {
    pub fn new(storage: Arc<dyn Storage>, customers: CustomerService, leads: LeadService) -> Self {
        Self { storage, customers, leads }
    }

    pub async fn handle_doubletick(&self, payload: &DoubleTickPayload) -> Result<WebhookOutcome, AppError> {
        let Some(phone) = payload.customer_phone.as_deref() else {
            return Ok(WebhookOutcome::Ignored("sem customerPhone".to_string()));
        };

        let mut tx = self.storage.begin().await?;
        let customer = self
            .customers
            .resolve(tx.as_mut(), phone, payload.customer_name.as_deref(), Channel::DoubleTick)
            .await?
            .customer;

        let outcome = match (payload.tag_added, payload.tag_name.as_deref()) {
            (true, Some(tag)) => {
                let lead = NewLead {
                    customer_id: customer.id,
                    stage: tag.to_string(),
                    source: Some(Channel::DoubleTick.lead_source().to_string()),
                    ..Default::default()
                };
                self.leads.append(tx.as_mut(), &lead).await?;
                tracing::info!(customer_id = customer.id, stage = tag, "Etiqueta do DoubleTick aplicada");
                WebhookOutcome::Recorded
            }
            _ if payload.tag_removed => WebhookOutcome::Ignored("etiqueta removida".to_string()),
            _ if payload.conversation_opened => WebhookOutcome::Ignored(format!(
                "conversa aberta por {}",
                payload.from.as_deref().unwrap_or("desconhecido")
            )),
            _ => WebhookOutcome::Ignored("evento sem etiqueta".to_string()),
        };

        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn handle_superfone(&self, payload: &SuperfonePayload) -> Result<WebhookOutcome, AppError> {
        let Some(caller_no) = payload.caller_no.as_deref() else {
            return Ok(WebhookOutcome::Ignored("sem caller_no".to_string()));
        };

        let mut tx = self.storage.begin().await?;
        let customer = self
            .customers
            .resolve(tx.as_mut(), caller_no, payload.customer_name.as_deref(), Channel::Superfone)
            .await?
            .customer;

        tx.create_call(&NewCall {
            call_id: payload.call_id.clone().unwrap_or_default(),
            caller_no: caller_no.to_string(),
            called_no: payload.called_no.clone(),
            start_time: payload.call_start_time.clone(),
            end_time: payload.call_end_time.clone(),
            duration: payload.duration,
            customer_id: customer.id,
        })
        .await?;

        if let Some(stage) = payload.lead_stage.as_deref() {
            let lead = NewLead {
                customer_id: customer.id,
                stage: stage.to_string(),
                source: Some(Channel::Superfone.lead_source().to_string()),
                comments: payload.comments.clone(),
                staff_name: payload.staff_name.clone(),
                staff_phone: payload.staff_phone.clone(),
                call_time: payload.call_start_time.clone(),
                call_duration: payload.duration,
                ..Default::default()
            };
            self.leads.append(tx.as_mut(), &lead).await?;
        }

        tx.commit().await?;
        Ok(WebhookOutcome::Recorded)
    }
}
