// src/common/error.rs

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

// Entidades que um id pode referenciar sem existir
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Store,
    Package,
    Customer,
    Booking,
}

impl Entity {
    pub fn label(self) -> &'static str {
        match self {
            Entity::Store => "Store",
            Entity::Package => "Package",
            Entity::Customer => "Customer",
            Entity::Booking => "Booking",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Payload inválido: {0}")]
    InvalidPayload(String),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{} não encontrado", .0.label())]
    NotFound(Entity),

    // Recusa de regra de negócio com mensagem própria (ex.: campo obrigatório do app)
    #[error("{error}")]
    Rejected { error: String, description: String },

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Falha de autenticação: {0}")]
    AuthenticationFailed(String),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn rejected(error: impl Into<String>, description: impl Into<String>) -> Self {
        AppError::Rejected { error: error.into(), description: description.into() }
    }

    /// Falha de infraestrutura (banco, hashing, etc.), e não do payload.
    pub fn is_internal(&self) -> bool {
        match self {
            AppError::DatabaseError(e) => !is_unique_violation(e),
            AppError::InternalServerError(_) | AppError::BcryptError(_) | AppError::JwtError(_) => true,
            _ => false,
        }
    }

    /// O envelope JSON da API. O status real vive no corpo, não no HTTP.
    pub fn envelope(&self) -> Value {
        match self {
            AppError::InvalidPayload(description) | AppError::UniqueConstraintViolation(description) => {
                invalid_payload(description)
            }
            AppError::ValidationError(errors) => {
                let mut details: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, field_errors)| {
                        field_errors.iter().map(move |e| match &e.message {
                            Some(message) => format!("{}: {}", field, message),
                            None => format!("{}: {}", field, e.code),
                        })
                    })
                    .collect();
                details.sort();
                invalid_payload(&details.join("; "))
            }
            AppError::NotFound(entity) => json!({
                "valid": false,
                "error": format!("{} not found.", entity.label()),
                "error_description": format!("{} does not exist", entity.label()),
            }),
            AppError::Rejected { error, description } => json!({
                "valid": false,
                "error": error,
                "error_description": description,
            }),
            AppError::AuthenticationFailed(description) => json!({
                "status": 400,
                "error": "Authentication failed",
                "error_description": description,
            }),
            AppError::Forbidden(description) => json!({
                "status": 403,
                "error": "Forbidden",
                "error_description": description,
            }),
            AppError::DatabaseError(e) if is_unique_violation(e) => {
                invalid_payload("A record with the same unique value already exists")
            }
            e => json!({
                "status": 500,
                "error": "Internal Server Error",
                "error_description": e.to_string(),
            }),
        }
    }
}

// Corpo ilegível, campo ausente ou content-type errado
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidPayload(rejection.body_text())
    }
}

fn invalid_payload(description: &str) -> Value {
    json!({
        "status": 400,
        "error": "Invalid payload",
        "error_description": description,
    })
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        // Convenção da API: HTTP 200 sempre, o status vai no corpo
        (StatusCode::OK, Json(self.envelope())).into_response()
    }
}
