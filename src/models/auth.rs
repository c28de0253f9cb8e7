// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employee_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeRole {
    Admin,
    Subadmin,
    Employee,
}

// Funcionário de loja (ou o admin global) vindo do banco
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i32,
    pub name: Option<String>,
    #[schema(example = "staff@striketheball.in")]
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub phone: Option<String>,
    pub employee_code: Option<String>,
    pub role: EmployeeRole,
    // Admin global não pertence a nenhuma loja
    pub store_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_admin(&self) -> bool {
        self.role == EmployeeRole::Admin
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "staff@striketheball.in")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub employee: Employee,
    pub token: String,
}

// Claims do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: i32, // ID do funcionário
    pub email: String,
    pub role: EmployeeRole,
    pub store_id: Option<i32>,
    pub exp: usize,
    pub iat: usize,
}
