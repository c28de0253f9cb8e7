// src/db/lead_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::customer::{Customer, Lead, NewLead, Tag, TagKind},
};

fn tag_table(kind: TagKind) -> &'static str {
    match kind {
        TagKind::Stage => "stages",
        TagKind::Source => "sources",
    }
}

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  ESCRITA (dentro da unidade de trabalho)
    // =========================================================================

    /// Acrescenta uma linha ao histórico do funil. Leads nunca são alterados.
    pub async fn create<'e, E>(&self, executor: E, lead: &NewLead) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                customer_id, stage, source, comments, store_id, callback_date,
                staff_name, staff_phone, call_time, call_duration
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(lead.customer_id)
        .bind(&lead.stage)
        .bind(&lead.source)
        .bind(&lead.comments)
        .bind(lead.store_id)
        .bind(lead.callback_date)
        .bind(&lead.staff_name)
        .bind(&lead.staff_phone)
        .bind(&lead.call_time)
        .bind(lead.call_duration)
        .fetch_one(executor)
        .await?;
        Ok(lead)
    }

    /// Registra um estágio/origem pelo nome. Nome já existente não é erro.
    pub async fn register_tag<'e, E>(&self, executor: E, kind: TagKind, name: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
            tag_table(kind)
        );
        sqlx::query(&sql).bind(name).execute(executor).await?;
        Ok(())
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn list_tags(&self, kind: TagKind) -> Result<Vec<Tag>, AppError> {
        let sql = format!("SELECT * FROM {} ORDER BY name", tag_table(kind));
        let tags = sqlx::query_as::<_, Tag>(&sql).fetch_all(&self.pool).await?;
        Ok(tags)
    }

    // Versão de API do registro: devolve a linha, nova ou existente
    pub async fn register_tag_returning(&self, kind: TagKind, name: &str) -> Result<Tag, AppError> {
        let sql = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING *",
            tag_table(kind)
        );
        let tag = sqlx::query_as::<_, Tag>(&sql)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(tag)
    }

    pub async fn list_for_customer(&self, customer_id: i32) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads WHERE customer_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(leads)
    }

    /// Clientes cujo lead MAIS RECENTE está no estágio informado.
    pub async fn customers_by_latest_stage(&self, stage: &str) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT c.*
            FROM customers c
            JOIN (
                SELECT DISTINCT ON (customer_id) customer_id, stage
                FROM leads
                ORDER BY customer_id, created_at DESC, id DESC
            ) latest ON latest.customer_id = c.id
            WHERE latest.stage = $1
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(stage)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn customers_by_source(&self, source: &str) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT c.*
            FROM customers c
            WHERE EXISTS (SELECT 1 FROM leads l WHERE l.customer_id = c.id AND l.source = $1)
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    /// Clientes com retorno agendado no intervalo `[from, to)`.
    pub async fn customers_with_callback_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT c.*
            FROM customers c
            WHERE EXISTS (
                SELECT 1 FROM leads l
                WHERE l.customer_id = c.id
                  AND l.callback_date >= $1
                  AND l.callback_date < $2
            )
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }
}
