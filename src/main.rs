//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::middleware::auth::{admin_guard, auth_guard};

fn router(app_state: AppState) -> Router {
    // Login (público) e perfil
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route(
            "/me",
            get(handlers::auth::me)
                .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard)),
        );

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer)
                .get(handlers::customers::list_customers)
                .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard)),
        )
        .route(
            "/{id}",
            delete(handlers::customers::delete_customer)
                .layer(axum_middleware::from_fn_with_state(app_state.clone(), admin_guard)),
        );

    let lead_routes = Router::new()
        .route("/", post(handlers::leads::create_lead))
        .route(
            "/stage",
            post(handlers::leads::create_stage).get(handlers::leads::list_stages),
        )
        .route(
            "/source",
            post(handlers::leads::create_source).get(handlers::leads::list_sources),
        )
        .route("/customer/{id}", get(handlers::leads::customer_leads))
        .route("/customers/stage/{stage}", get(handlers::leads::customers_by_stage))
        .route("/customers/source/{source}", get(handlers::leads::customers_by_source))
        .route("/today-callbacks", get(handlers::leads::today_callbacks))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let employee_routes = Router::new()
        .route(
            "/booking",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_bookings),
        )
        .route("/booking/logs", get(handlers::bookings::booking_logs))
        .route("/booking/status/{status}", get(handlers::bookings::list_bookings_by_status))
        .route(
            "/booking/{id}",
            get(handlers::bookings::get_booking).put(handlers::bookings::consume_overs),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Só a lista de pacotes é pública; o resto exige o admin
    let admin_routes = Router::new()
        .route("/booking", get(handlers::bookings::admin_list_bookings))
        .route("/booking/store/{store_id}", get(handlers::bookings::admin_list_store_bookings))
        .route("/booking/{id}", put(handlers::bookings::admin_consume_overs))
        .route("/store", get(handlers::catalog::list_stores))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), admin_guard))
        .route("/package", get(handlers::catalog::list_packages));

    let user_routes = Router::new().route("/book-slot", post(handlers::webhooks::book_slot));

    // Webhooks dos provedores
    let webhook_routes = Router::new()
        .route(
            "/webhook",
            post(handlers::webhooks::whatsapp).get(handlers::webhooks::verify_whatsapp),
        )
        .route("/ivrhook", post(handlers::webhooks::ivr))
        .route("/doubletickhook", post(handlers::webhooks::doubletick))
        .route("/superfonehook", post(handlers::webhooks::superfone))
        .route("/enquiry", post(handlers::webhooks::enquiry));

    // Combina tudo no router principal
    Router::new()
        .route("/", get(|| async { Json(json!({ "message": "Welcome to Strike The Ball" })) }))
        .route("/ping", get(|| async { Json(json!({ "status": 200, "message": "pong" })) }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(webhook_routes)
        .nest("/auth", auth_routes)
        .nest("/customer", customer_routes)
        .nest("/lead", lead_routes)
        .nest("/emp", employee_routes)
        .nest("/admin", admin_routes)
        .nest("/user", user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::test_support::test_state, db::memory::MemoryStorage};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get(path: &str) -> (StatusCode, Value) {
        let storage = MemoryStorage::seeded();
        let response = router(test_state(&storage))
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_greets_in_json() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to Strike The Ball");
    }

    #[tokio::test]
    async fn store_list_requires_a_token() {
        let (status, body) = get("/admin/store").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "Authentication failed");
        assert_eq!(body["error_description"], "token is required");
    }
}
