// src/db/webhook_repo.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::webhook::{Call, NewCall, WaHook},
};

// Padrão que identifica uma escolha de pacote/overs no log do WhatsApp
pub const SELECTION_PATTERN: &str = "%Overs%";

#[derive(Clone, Default)]
pub struct WebhookRepository;

impl WebhookRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn append_wa_hook<'e, E>(
        &self,
        executor: E,
        phone: &str,
        customer_id: i32,
        response: &Value,
    ) -> Result<WaHook, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let hook = sqlx::query_as::<_, WaHook>(
            r#"
            INSERT INTO wa_hooks (phone, customer_id, response)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(phone)
        .bind(customer_id)
        .bind(response)
        .fetch_one(executor)
        .await?;
        Ok(hook)
    }

    /// A escolha de pacote mais recente registrada para o telefone.
    ///
    /// `since` limita a busca a uma janela; `None` não tem expiração.
    /// Empate de `created_at` é decidido pelo id (o último inserido vence).
    pub async fn latest_selection<'e, E>(
        &self,
        executor: E,
        phone: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<WaHook>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let hook = sqlx::query_as::<_, WaHook>(
            r#"
            SELECT * FROM wa_hooks
            WHERE phone = $1
              AND response->>'selected' LIKE $2
              AND ($3::TIMESTAMPTZ IS NULL OR created_at >= $3)
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(phone)
        .bind(SELECTION_PATTERN)
        .bind(since)
        .fetch_optional(executor)
        .await?;
        Ok(hook)
    }

    pub async fn create_call<'e, E>(&self, executor: E, call: &NewCall) -> Result<Call, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let call = sqlx::query_as::<_, Call>(
            r#"
            INSERT INTO calls (call_id, caller_no, called_no, start_time, end_time, duration, customer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&call.call_id)
        .bind(&call.caller_no)
        .bind(&call.called_no)
        .bind(&call.start_time)
        .bind(&call.end_time)
        .bind(call.duration)
        .bind(call.customer_id)
        .fetch_one(executor)
        .await?;
        Ok(call)
    }
}
