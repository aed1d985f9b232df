use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) mod badges;
pub(crate) mod catalog;
pub(crate) mod challenge;
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod events;
mod import;
pub(crate) mod models;
pub(crate) mod persistence;
pub(crate) mod progress;
mod router;
mod routes;
pub(crate) mod store;
mod templates;

use crate::persistence::{FileStorage, MemoryStorage, ProgressPersistence, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemflash=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let catalog = match &config.catalog_path {
        Some(path) => catalog::Catalog::load(path)?,
        None => catalog::Catalog::builtin()?,
    };

    let storage: Box<dyn Storage> = match &config.state_dir {
        Some(dir) => {
            info!("Persisting progress under {}", dir.display());
            Box::new(FileStorage::new(dir))
        }
        None => {
            info!("STATE_DIR not set, progress is kept in memory only");
            Box::new(MemoryStorage::default())
        }
    };

    let state = router::AppState::new(catalog, ProgressPersistence::new(storage), &config);
    let app = router::init_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!(
        "GemFlash running on http://{} (challenges from {})",
        config.bind_addr, config.challenge_api_url
    );
    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
