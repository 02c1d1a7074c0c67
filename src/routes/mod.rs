pub mod ask;
pub mod fallacies;
pub mod history;
pub mod summarize;

use axum::{Json, Router, routing::get};
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .merge(summarize::routes())
        .merge(fallacies::routes())
        .merge(history::routes())
        .merge(ask::routes())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
