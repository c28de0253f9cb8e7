// src/services/customer_service.rs

use std::sync::Arc;

use crate::{
    common::error::{AppError, Entity},
    db::{CustomerRepository, Storage, StorageTx},
    models::customer::{Channel, Customer, CustomerType, NewCustomer, NewLead, TagKind},
};

/// Cliente resolvido para um telefone, e se ele acabou de ser criado.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub customer: Customer,
    pub created: bool,
}

#[derive(Clone)]
pub struct CustomerService {
    storage: Arc<dyn Storage>,
    repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(storage: Arc<dyn Storage>, repo: CustomerRepository) -> Self {
        Self { storage, repo }
    }

    /// Encontra ou cria o cliente do telefone.
    ///
    /// Na criação, o cliente recebe a etiqueta do canal e ganha um lead
    /// "New" com a origem do canal. Um cliente existente nunca é alterado.
    pub async fn resolve(
        &self,
        tx: &mut dyn StorageTx,
        phone: &str,
        name: Option<&str>,
        channel: Channel,
    ) -> Result<Resolved, AppError> {
        let candidate = NewCustomer {
            name: name.map(str::to_string),
            phone: phone.to_string(),
            email: None,
            customer_type: channel.customer_type(),
        };

        if let Some(customer) = tx.insert_customer_if_absent(&candidate).await? {
            let lead = NewLead::acquisition(customer.id, channel);
            tx.register_tag(TagKind::Stage, &lead.stage).await?;
            tx.register_tag(TagKind::Source, channel.lead_source()).await?;
            tx.create_lead(&lead).await?;

            tracing::info!(customer_id = customer.id, "Novo cliente via {}", channel.lead_source());
            return Ok(Resolved { customer, created: true });
        }

        let customer = tx
            .find_customer_by_phone(phone)
            .await?
            .ok_or_else(|| anyhow::anyhow!("cliente {} sumiu entre o upsert e a leitura", phone))?;
        Ok(Resolved { customer, created: false })
    }

    // =========================================================================
    //  CADASTRO MANUAL
    // =========================================================================

    pub async fn create(&self, name: &str, phone: &str, email: Option<&str>) -> Result<Customer, AppError> {
        let mut tx = self.storage.begin().await?;
        let candidate = NewCustomer {
            name: Some(name.to_string()),
            phone: phone.to_string(),
            email: email.map(str::to_string),
            customer_type: CustomerType::Normal,
        };
        let customer = tx
            .insert_customer_if_absent(&candidate)
            .await?
            .ok_or_else(|| AppError::UniqueConstraintViolation("Customer with phone already exist".to_string()))?;
        tx.commit().await?;
        Ok(customer)
    }

    pub async fn list(&self) -> Result<Vec<Customer>, AppError> {
        self.repo.list().await
    }

    pub async fn delete(&self, id: i32) -> Result<Customer, AppError> {
        self.repo.delete(id).await?.ok_or(AppError::NotFound(Entity::Customer))
    }
}
