use std::sync::Arc;

use anyhow::Context;
use common::mail::build_mailer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;
use server::store::Store;
use server::store::memory::MemoryStore;
use server::store::postgres::SeaOrmStore;
use server::utils::jwt::TokenIssuer;
use server::{build_router, database, seed};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let store: Arc<dyn Store> = if config.database.is_memory() {
        info!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let db = database::init_db(&config.database.url)
            .await
            .context("Failed to connect to the database")?;
        info!("Using database store");
        Arc::new(SeaOrmStore::new(db))
    };

    if let Some(bootstrap) = &config.bootstrap {
        seed::ensure_superuser(store.as_ref(), bootstrap)
            .await
            .context("Failed to ensure bootstrap superuser")?;
    }

    let mailer = build_mailer(&config.mail)
        .await
        .context("Failed to initialise mailer")?;
    info!(backend = ?config.mail.backend, "Mailer ready");

    let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app = build_router(AppState {
        store,
        mailer,
        tokens,
        config,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
