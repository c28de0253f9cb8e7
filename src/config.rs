// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{BookingRepository, CustomerRepository, EmployeeRepository, LeadRepository, PgStorage, Storage},
    services::{
        auth::AuthService, booking_service::BookingService, call_center_service::CallCenterService,
        correlation::CorrelationStore, customer_service::CustomerService,
        direct_booking_service::DirectBookingService, ivr_service::IvrService, lead_service::LeadService,
        whatsapp_service::WhatsAppService,
    },
};

// Configuração lida do ambiente (.env aceito)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub ivr_country_code: String,
    // None = escolha do WhatsApp nunca expira
    pub wa_selection_window: Option<chrono::Duration>,
    pub wa_verify_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().context("DB_MAX_CONNECTIONS deve ser um inteiro")?,
            Err(_) => 5,
        };

        let wa_selection_window = match env::var("WA_SELECTION_WINDOW_MINUTES") {
            Ok(raw) => Some(parse_selection_window(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            ivr_country_code: env::var("IVR_COUNTRY_CODE").unwrap_or_else(|_| "91".to_string()),
            wa_selection_window,
            wa_verify_token: env::var("WA_VERIFY_TOKEN").ok().filter(|t| !t.is_empty()),
        })
    }
}

fn parse_selection_window(raw: &str) -> anyhow::Result<chrono::Duration> {
    let minutes: i64 = raw.trim().parse().context("WA_SELECTION_WINDOW_MINUTES deve ser um inteiro")?;
    anyhow::ensure!(minutes > 0, "WA_SELECTION_WINDOW_MINUTES deve ser positivo");
    chrono::Duration::try_minutes(minutes).context("WA_SELECTION_WINDOW_MINUTES fora do intervalo")
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,

    pub auth_service: AuthService,
    pub customer_service: CustomerService,
    pub lead_service: LeadService,
    pub booking_service: BookingService,
    pub whatsapp_service: WhatsAppService,
    pub ivr_service: IvrService,
    pub call_center_service: CallCenterService,
    pub direct_booking_service: DirectBookingService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(db_pool.clone()));
        Ok(Self::from_parts(config, db_pool, storage))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_parts(config: AppConfig, db_pool: PgPool, storage: Arc<dyn Storage>) -> Self {
        let customer_service = CustomerService::new(storage.clone(), CustomerRepository::new(db_pool.clone()));
        let lead_service = LeadService::new(storage.clone(), LeadRepository::new(db_pool.clone()));
        let booking_service = BookingService::new(storage.clone(), BookingRepository::new(db_pool.clone()));

        let whatsapp_service = WhatsAppService::new(
            storage.clone(),
            customer_service.clone(),
            booking_service.clone(),
            CorrelationStore::new(config.wa_selection_window),
        );
        let ivr_service = IvrService::new(
            storage.clone(),
            customer_service.clone(),
            booking_service.clone(),
            config.ivr_country_code.clone(),
        );
        let call_center_service =
            CallCenterService::new(storage.clone(), customer_service.clone(), lead_service.clone());
        let direct_booking_service =
            DirectBookingService::new(storage.clone(), customer_service.clone(), booking_service.clone());
        let auth_service = AuthService::new(EmployeeRepository::new(db_pool.clone()), config.jwt_secret.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            customer_service,
            lead_service,
            booking_service,
            whatsapp_service,
            ivr_service,
            call_center_service,
            direct_booking_service,
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::db::memory::MemoryStorage;

    // Pool que nunca conecta; só pode ser criado dentro de um runtime tokio
    pub fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://striketheball@localhost/striketheball_test")
            .expect("URL de teste válida")
    }

    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://striketheball@localhost/striketheball_test".to_string(),
            jwt_secret: "segredo-de-teste".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            db_max_connections: 1,
            ivr_country_code: "91".to_string(),
            wa_selection_window: None,
            wa_verify_token: Some("verifica-me".to_string()),
        }
    }

    pub fn test_state(storage: &MemoryStorage) -> AppState {
        AppState::from_parts(test_config(), lazy_pool(), Arc::new(storage.clone()))
    }
}
