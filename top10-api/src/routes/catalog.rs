//! Manifest and catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use top10_core::CatalogDocument;
use top10_services::CachedCatalog;

use crate::AppState;

/// Create catalog routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/manifest.json", get(get_manifest))
        .route("/catalog/{content_type}/{file}", get(get_catalog))
}

/// GET / - Entry point pointing at the manifest
async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "manifest": "/manifest.json"
    }))
}

/// GET /manifest.json
async fn get_manifest(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.settings.manifest())
}

/// GET /catalog/{type}/{id}.json - Current catalog records
async fn get_catalog(
    State(state): State<AppState>,
    Path((content_type, file)): Path<(String, String)>,
) -> impl IntoResponse {
    let catalog_id = file.strip_suffix(".json").unwrap_or(&file);

    if content_type != state.settings.content_type.as_str() || catalog_id != state.settings.id {
        debug!("Unknown catalog requested: {}/{}", content_type, file);
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": format!("Unknown catalog: {}/{}", content_type, catalog_id)
            })),
        )
            .into_response();
    }

    (StatusCode::OK, Json(current_catalog(&state).await)).into_response()
}

/// Serve the cached document, re-reading the artifact once it goes stale
async fn current_catalog(state: &AppState) -> CatalogDocument {
    let now = Utc::now();
    {
        let cache = state.cache.read().await;
        if cache.is_fresh(now) {
            return cache.document.clone();
        }
    }

    let mut cache = state.cache.write().await;
    // Another request may have reloaded while we waited for the lock
    if !cache.is_fresh(now) {
        let ttl = cache.ttl;
        let store = Arc::clone(&state.store);
        let settings = Arc::clone(&state.settings);
        let reload =
            tokio::task::spawn_blocking(move || CachedCatalog::load(&store, &settings, ttl, now));
        match reload.await {
            Ok(reloaded) => {
                *cache = reloaded;
                info!("Reloaded catalog artifact ({} records)", cache.document.metas.len());
            }
            Err(e) => warn!("Catalog reload task failed, serving the previous document: {}", e),
        }
    }
    cache.document.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use top10_core::{CatalogRecord, ContentType};
    use top10_services::{CatalogSettings, CatalogStore};
    use tower::ServiceExt;

    fn record(id: &str) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            content_type: ContentType::Series,
            name: "Wednesday".to_string(),
            poster: None,
            description: "#1 in Top 10 this week".to_string(),
        }
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = crate::app(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn state_with(dir: &tempfile::TempDir, ttl_secs: i64) -> AppState {
        AppState::new(
            CatalogSettings::default(),
            CatalogStore::new(dir.path().join("catalog.json")),
            chrono::Duration::seconds(ttl_secs),
        )
    }

    #[tokio::test]
    async fn test_root_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, 300);

        let (status, body) = get_json(state.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"ok": true, "manifest": "/manifest.json"}));

        let (status, body) = get_json(state, "/manifest.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "netflix-top10-nl");
        assert_eq!(body["catalogs"][0]["type"], "series");
        assert_eq!(body["resources"][0], "catalog");
    }

    #[tokio::test]
    async fn test_missing_artifact_serves_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_json(
            state_with(&dir, 300),
            "/catalog/series/netflix-top10-nl.json",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metas"][0]["id"], "netflix-top10-nl-cache-missing");
    }

    #[tokio::test]
    async fn test_stale_cache_reloads_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, 0);

        CatalogStore::new(dir.path().join("catalog.json"))
            .write(&CatalogDocument::new(vec![record("tmdb:tv:119051")]))
            .unwrap();

        let (_, body) = get_json(state, "/catalog/series/netflix-top10-nl.json").await;
        assert_eq!(body["metas"][0]["id"], "tmdb:tv:119051");
        assert_eq!(body["metas"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_catalog_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, 300);

        let (status, body) = get_json(state.clone(), "/catalog/series/other.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("other"));

        let (status, _) = get_json(state, "/catalog/movie/netflix-top10-nl.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
