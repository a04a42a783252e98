// src/bin/api_server.rs

use anyhow::Context;
use color_sync_hub::infra::{config, logging};
use color_sync_hub::transport;
use color_sync_hub::{ExportClient, PostgresStore, SyncCoordinator, SyncStore};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging(config::log_format()?)?;

    // --- Store Initialization ---
    tracing::info!("connecting to Postgres");
    let store = PostgresStore::connect(
        &config::database_url()?,
        config::database_max_connections()?,
    )
    .await
    .context("failed to connect the Postgres store")?;
    let store: Arc<dyn SyncStore> = Arc::new(store);

    // --- Sync Coordinator Initialization ---
    let policy = config::reference_policy()?;
    let client = ExportClient::new(config::sync_http_timeout()?)
        .context("failed to build the export HTTP client")?;
    let coordinator = Arc::new(SyncCoordinator::new(store.clone(), client, policy));
    tracing::info!(reference_policy = %policy, "sync coordinator ready");

    // --- API Server Initialization ---
    let app_state = transport::http::AppState::new(coordinator, store);
    let app = transport::http::create_router(app_state).merge(
        SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
    );

    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!(addr = %bind_addr, "API server listening (Swagger UI at /swagger-ui)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("graceful shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
