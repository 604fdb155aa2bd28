use anyhow::{Context, Result};
use chrono::Duration;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use social_feed::api::{self, AppState};
use social_feed::auth::TokenService;
use social_feed::config::{Config, LogFormat, StorageBackend};
use social_feed::db::init_database;
use social_feed::media::LocalMediaStore;
use social_feed::metrics::ApiMetrics;
use social_feed::store::{MemoryStore, PgStore, SocialStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Load configuration
    let config = Config::from_env().context("invalid configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,social_feed=debug".into()),
    );
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
    info!("Initialized configuration");

    let store: Arc<dyn SocialStore> = match config.storage {
        StorageBackend::Postgres => {
            let db = Arc::new(init_database(&config.database).await?);
            info!("Connected to database");
            Arc::new(PgStore::new(db))
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    tokio::fs::create_dir_all(&config.media.upload_dir)
        .await
        .with_context(|| format!("failed to create upload dir {}", config.media.upload_dir.display()))?;
    let media = Arc::new(LocalMediaStore::new(
        config.media.upload_dir.clone(),
        config.media.public_path.clone(),
    ));

    let tokens = TokenService::new(
        config.auth.jwt_secret.as_bytes(),
        Duration::days(config.auth.token_ttl_days),
    );
    let metrics = ApiMetrics::new().context("failed to register metrics")?;

    let state = AppState::new(store, tokens, media.clone(), metrics);
    api::start_api_server(&config, state, media.root()).await?;

    info!("Social feed shutdown complete");
    Ok(())
}
