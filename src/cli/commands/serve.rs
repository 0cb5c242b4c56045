use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::{app, AppState};
use crate::config::config;
use crate::database::{DatabaseManager, MemoryStorage, PgStorage, Storage};

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = config().clone();
    if let Some(port) = port {
        config.api.port = port;
    }
    info!("Starting Asset Tracker in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        if crate::is_production!() {
            anyhow::bail!("JWT_SECRET must be set in production");
        }
        warn!("JWT_SECRET is empty; every protected operation will be denied");
    }

    let (storage, pool): (Arc<dyn Storage>, Option<PgPool>) = match config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            (Arc::new(PgStorage::new(pool.clone())), Some(pool))
        }
        None => {
            warn!("DATABASE_URL is not set; using in-memory storage (data is lost on exit)");
            (Arc::new(MemoryStorage::new()), None)
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let router = app(AppState::new(config, storage));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Asset Tracker listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pool) = pool {
        DatabaseManager::close(&pool).await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
