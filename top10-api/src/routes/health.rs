//! Health check endpoints

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    records: usize,
    cache_fresh: bool,
    cache_missing: bool,
}

/// Health check handler
///
/// Degraded while the artifact has not been built yet.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let cache = state.cache.read().await;
    let missing_id = format!("{}-cache-missing", state.settings.id);
    let cache_missing = cache.document.metas.iter().any(|r| r.id == missing_id);

    let (code, status) = if cache_missing {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    } else {
        (StatusCode::OK, "healthy")
    };

    let response = HealthResponse {
        status: status.to_string(),
        records: cache.document.metas.len(),
        cache_fresh: cache.is_fresh(Utc::now()),
        cache_missing,
    };

    (code, Json(response))
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}
