// src/services/lead_service.rs

use std::sync::Arc;

use chrono::{Days, NaiveDate};

use crate::{
    common::error::{AppError, Entity},
    db::{LeadRepository, Storage, StorageTx},
    models::customer::{Customer, Lead, NewLead, Tag, TagKind},
};

#[derive(Clone)]
pub struct LeadService {
    storage: Arc<dyn Storage>,
    repo: LeadRepository,
}

impl LeadService {
    pub fn new(storage: Arc<dyn Storage>, repo: LeadRepository) -> Self {
        Self { storage, repo }
    }

    /// Acrescenta um lead ao histórico, registrando estágio e origem se forem novos.
    pub async fn append(&self, tx: &mut dyn StorageTx, lead: &NewLead) -> Result<Lead, AppError> {
        tx.register_tag(TagKind::Stage, &lead.stage).await?;
        if let Some(source) = &lead.source {
            tx.register_tag(TagKind::Source, source).await?;
        }
        tx.create_lead(lead).await
    }

    // POST /lead
    pub async fn create(&self, lead: NewLead) -> Result<Lead, AppError> {
        let mut tx = self.storage.begin().await?;

        if tx.find_customer(lead.customer_id).await?.is_none() {
            return Err(AppError::NotFound(Entity::Customer));
        }
        if let Some(store_id) = lead.store_id {
            if tx.find_store(store_id).await?.is_none() {
                return Err(AppError::NotFound(Entity::Store));
            }
        }

        let lead = self.append(tx.as_mut(), &lead).await?;
        tx.commit().await?;
        Ok(lead)
    }

    // =========================================================================
    //  VOCABULÁRIOS E CONSULTAS
    // =========================================================================

    pub async fn list_tags(&self, kind: TagKind) -> Result<Vec<Tag>, AppError> {
        self.repo.list_tags(kind).await
    }

    pub async fn register_tag(&self, kind: TagKind, name: &str) -> Result<Tag, AppError> {
        self.repo.register_tag_returning(kind, name).await
    }

    pub async fn leads_for_customer(&self, customer_id: i32) -> Result<Vec<Lead>, AppError> {
        self.repo.list_for_customer(customer_id).await
    }

    pub async fn customers_in_stage(&self, stage: &str) -> Result<Vec<Customer>, AppError> {
        self.repo.customers_by_latest_stage(stage).await
    }

    pub async fn customers_from_source(&self, source: &str) -> Result<Vec<Customer>, AppError> {
        self.repo.customers_by_source(source).await
    }

    /// Clientes com retorno marcado para o dia (UTC).
    pub async fn callbacks_on(&self, day: NaiveDate) -> Result<Vec<Customer>, AppError> {
        let from = day.and_time(chrono::NaiveTime::MIN).and_utc();
        let next = day
            .checked_add_days(Days::new(1))
            .ok_or_else(|| anyhow::anyhow!("data fora do intervalo: {}", day))?;
        let to = next.and_time(chrono::NaiveTime::MIN).and_utc();
        self.repo.customers_with_callback_between(from, to).await
    }
}
