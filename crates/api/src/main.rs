use anyhow::Context;

use outpost_infra::{AppConfig, PostgresStore, StorageConfig, Stores};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    outpost_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.insecure_jwt_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let stores = match &config.storage {
        StorageConfig::InMemory => {
            tracing::warn!("USE_PERSISTENT_STORES not enabled; data is kept in memory only");
            Stores::in_memory()
        }
        StorageConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresStore::connect(database_url, *max_connections)
                .await
                .context("failed to connect to Postgres")?;
            store.ensure_schema().await.context("failed to create schema")?;
            Stores::postgres(store)
        }
    };

    let app = outpost_api::app::build_app(&config, stores.clone())
        .await
        .context("failed to build app")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        storage = config.storage_kind(),
        api_prefix = %config.api_prefix,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    stores.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
