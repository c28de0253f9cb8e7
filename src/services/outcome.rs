// src/services/outcome.rs

use crate::{common::error::AppError, models::booking::Booking};

/// O que uma entrega de webhook produziu.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Booked(Booking),
    /// Escolha de pacote gravada; a reserva vem na próxima entrega.
    SelectionRecorded,
    /// Cliente, chamada ou lead registrados, sem reserva.
    Recorded,
    /// Nada a reservar. O motivo vai para o log.
    Ignored(String),
}

impl WebhookOutcome {
    pub fn booking(&self) -> Option<&Booking> {
        match self {
            WebhookOutcome::Booked(booking) => Some(booking),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Booked(_) => "booked",
            WebhookOutcome::SelectionRecorded => "selection_recorded",
            WebhookOutcome::Recorded => "recorded",
            WebhookOutcome::Ignored(_) => "ignored",
        }
    }
}

/// Recusa de negócio do materializador vira no-op; falha de infraestrutura sobe.
pub fn booked_or_ignored(result: Result<Booking, AppError>) -> Result<WebhookOutcome, AppError> {
    match result {
        Ok(booking) => Ok(WebhookOutcome::Booked(booking)),
        Err(e) if e.is_internal() => Err(e),
        Err(e) => Ok(WebhookOutcome::Ignored(format!("reserva recusada: {}", e))),
    }
}
