//! Weekly Top 10 Catalog API Server
//!
//! Serves the manifest and the cached catalog artifact written by the
//! `top10-refresh` job.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use top10_services::{CachedCatalog, CatalogSettings, CatalogStore, PipelineConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_PORT: u16 = 8000;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<CatalogSettings>,
    pub store: Arc<CatalogStore>,
    /// Last loaded artifact, re-read from disk once its TTL expires
    pub cache: Arc<RwLock<CachedCatalog>>,
}

impl AppState {
    pub fn new(settings: CatalogSettings, store: CatalogStore, ttl: chrono::Duration) -> Self {
        let cached = CachedCatalog::load(&store, &settings, ttl, Utc::now());
        Self {
            settings: Arc::new(settings),
            store: Arc::new(store),
            cache: Arc::new(RwLock::new(cached)),
        }
    }
}

/// Build the router with CORS and request tracing
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(routes::catalog_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,top10_api=debug")),
        )
        .init();

    info!("Starting Top 10 Catalog API");

    let config = PipelineConfig::from_env()?;
    info!(
        "Serving catalog '{}' from {} (ttl {}s)",
        config.catalog.id,
        config.cache_path.display(),
        config.cache_ttl_secs
    );

    let state = AppState::new(
        config.catalog.clone(),
        CatalogStore::new(&config.cache_path),
        config.cache_ttl(),
    );

    let app = app(state);

    // Start server
    let port = server_port(|key| std::env::var(key).ok());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `SERVER_PORT`, then `PORT`, then the default
fn server_port<F>(lookup: F) -> u16
where
    F: Fn(&str) -> Option<String>,
{
    ["SERVER_PORT", "PORT"]
        .iter()
        .find_map(|key| lookup(key).and_then(|p| p.trim().parse().ok()))
        .unwrap_or(DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_port_precedence() {
        assert_eq!(server_port(|_| None), 8000);
        assert_eq!(
            server_port(|k| (k == "PORT").then(|| "9000".to_string())),
            9000
        );
        assert_eq!(
            server_port(|k| match k {
                "SERVER_PORT" => Some("3001".to_string()),
                "PORT" => Some("9000".to_string()),
                _ => None,
            }),
            3001
        );
        assert_eq!(
            server_port(|k| (k == "SERVER_PORT").then(|| "abc".to_string())),
            8000
        );
    }
}
