mod routes;
pub mod handlers;

use crate::auth::TokenService;
use crate::config::Config;
use crate::media::MediaStore;
use crate::metrics::ApiMetrics;
use crate::store::SocialStore;
use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use routes::build_router;

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
    pub tokens: Arc<TokenService>,
    pub media: Arc<dyn MediaStore>,
    pub metrics: ApiMetrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SocialStore>,
        tokens: TokenService,
        media: Arc<dyn MediaStore>,
        metrics: ApiMetrics,
    ) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            media,
            metrics,
        }
    }
}

/// Start the API server and run until Ctrl-C
pub async fn start_api_server(config: &Config, state: AppState, upload_root: &Path) -> Result<()> {
    // Set up CORS
    let cors = if config.server.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let app = build_router(state, config.media.max_upload_bytes)
        .nest_service(&config.media.public_path, ServeDir::new(upload_root))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Get bind address
    let addr = format!("{}:{}", config.server.host, config.server.port)
        .parse::<SocketAddr>()?;

    // Start server
    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
