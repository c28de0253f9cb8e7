// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::customer::{Customer, NewCustomer},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_phone<'e, E>(&self, executor: E, phone: &str) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE phone = $1")
            .bind(phone)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    /// Insere o cliente se o telefone ainda não existe.
    ///
    /// Devolve `None` quando outro registro já ocupa o telefone. O `ON CONFLICT`
    /// faz a checagem e a escrita num único comando, sem janela entre elas.
    pub async fn insert_if_absent<'e, E>(
        &self,
        executor: E,
        customer: &NewCustomer,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let created = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone, email, customer_type)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (phone) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.customer_type)
        .fetch_optional(executor)
        .await?;
        Ok(created)
    }

    // Leituras e escritas avulsas vão direto no pool

    pub async fn list(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn delete(&self, id: i32) -> Result<Option<Customer>, AppError> {
        let deleted = sqlx::query_as::<_, Customer>("DELETE FROM customers WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deleted)
    }
}
