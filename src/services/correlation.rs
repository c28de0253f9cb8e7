// src/services/correlation.rs
//
// Liga as duas entregas do fluxo do WhatsApp (escolha do pacote, depois
// loja/data/horário) pelo telefone e pela ordem de chegada no log `wa_hooks`.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::{common::error::AppError, db::StorageTx};

#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationStore {
    // None = sem expiração
    window: Option<Duration>,
}

impl CorrelationStore {
    pub fn new(window: Option<Duration>) -> Self {
        Self { window }
    }

    /// Grava a escolha da lista exatamente como veio: `{"selected": title}`.
    pub async fn record_selection(
        &self,
        tx: &mut dyn StorageTx,
        phone: &str,
        customer_id: i32,
        title: &str,
    ) -> Result<(), AppError> {
        tx.append_wa_hook(phone, customer_id, &json!({ "selected": title })).await?;
        Ok(())
    }

    /// Texto da escolha de pacote/overs mais recente do telefone, dentro da janela.
    pub async fn find_pending_selection(
        &self,
        tx: &mut dyn StorageTx,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, AppError> {
        // Janela maior que o calendário do chrono: sem corte
        let since = self.window.and_then(|window| now.checked_sub_signed(window));
        let hook = tx.latest_selection(phone, since).await?;
        Ok(hook.and_then(|h| h.selected().map(str::to_string)))
    }
}
