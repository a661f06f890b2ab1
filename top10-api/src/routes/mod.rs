//! API route definitions

mod catalog;
mod health;

use axum::Router;
use crate::AppState;

/// Create all catalog-facing routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog::routes())
        .merge(health::routes())
}
