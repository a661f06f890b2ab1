//! Weekly Top 10 catalog refresh job
//!
//! Runs the pipeline once and replaces the catalog artifact. Exits non-zero
//! when no source produced a usable ranking; the previous artifact is left
//! in place.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use top10_services::{CatalogPipeline, CatalogStore, PipelineConfig, PipelineError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::from_filename(".env.local") {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,top10_refresh=debug")),
        )
        .init();

    let config = PipelineConfig::from_env().context("Invalid configuration")?;
    info!(
        "Refreshing Top 10 for region '{}' category '{}' into {}",
        config.region,
        config.category,
        config.cache_path.display()
    );

    let store = CatalogStore::new(&config.cache_path);
    let pipeline = CatalogPipeline::from_config(&config)?;

    match pipeline.refresh(&store).await {
        Ok(document) => {
            info!("Catalog refreshed with {} records", document.metas.len());
            Ok(())
        }
        Err(e) => {
            if let PipelineError::Sources(source_error) = &e {
                for attempt in source_error.attempts() {
                    error!("  {} failed: {}", attempt.source, attempt.error);
                }
            }
            error!("Refresh failed, keeping the previous artifact: {}", e);
            Err(e.into())
        }
    }
}
