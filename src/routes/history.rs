//! History and highlight endpoints
//!
//! Everything here is a thin mapping from record-store results onto status
//! codes: `None`/`false` becomes 404, storage errors become 500.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::domain::videos;
use crate::models::{Highlight, HistoryItem, VideoRecord};
use crate::services::error::{ApiError, LogErr};

const DEFAULT_LIMIT: i64 = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/history", get(list_history))
        .route("/api/history/{video_id}", get(get_record).delete(delete_record))
        .route("/api/history/{video_id}/restore", post(restore_record))
        .route("/api/history/{video_id}/highlights", post(add_highlight))
        .route(
            "/api/history/{video_id}/highlights/{index}",
            delete(remove_highlight),
        )
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    items: Vec<HistoryItem>,
}

#[derive(Debug, Deserialize)]
struct AddHighlightRequest {
    start: i64,
    end: i64,
}

#[derive(Debug, Serialize)]
struct HighlightsResponse {
    highlights: Vec<Highlight>,
}

fn validate_limit(raw: Option<i64>) -> Result<i64, ApiError> {
    let value = raw.unwrap_or(DEFAULT_LIMIT);
    if !(1..=100).contains(&value) {
        return Err(ApiError::validation("limit must be between 1 and 100"));
    }
    Ok(value)
}

fn validate_range(start: i64, end: i64) -> Result<(), ApiError> {
    if start < 0 || end <= start {
        return Err(ApiError::validation(
            "start must be >= 0 and end must be greater than start",
        ));
    }
    Ok(())
}

/// GET /api/history - List recent summaries, newest first
async fn list_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = validate_limit(query.limit)?;

    let items = videos::list_recent(&state.db, limit)
        .await
        .log_500("history: listing failed")?;

    Ok(Json(HistoryResponse { items }))
}

/// GET /api/history/:video_id - Full record including the transcript
async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoRecord>, ApiError> {
    videos::get_live(&state.db, &video_id)
        .await
        .log_500("history: record lookup failed")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No summary exists for this video."))
}

/// DELETE /api/history/:video_id - Soft-delete a record
async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = videos::soft_delete(&state.db, &video_id)
        .await
        .log_500("history: delete failed")?;

    if !deleted {
        return Err(ApiError::not_found("No summary exists for this video."));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/history/:video_id/restore - Undo a soft-delete
async fn restore_record(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<HistoryItem>, ApiError> {
    videos::restore(&state.db, &video_id)
        .await
        .log_500("history: restore failed")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No deleted summary exists for this video."))
}

/// POST /api/history/:video_id/highlights - Add a highlight range
async fn add_highlight(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    Json(req): Json<AddHighlightRequest>,
) -> Result<Json<HighlightsResponse>, ApiError> {
    validate_range(req.start, req.end)?;

    videos::add_highlight(&state.db, &video_id, req.start, req.end)
        .await
        .log_500("history: adding highlight failed")?
        .map(|highlights| Json(HighlightsResponse { highlights }))
        .ok_or_else(|| ApiError::not_found("No summary exists for this video."))
}

/// DELETE /api/history/:video_id/highlights/:index - Remove one highlight
async fn remove_highlight(
    State(state): State<Arc<AppState>>,
    Path((video_id, index)): Path<(String, usize)>,
) -> Result<Json<HighlightsResponse>, ApiError> {
    videos::remove_highlight(&state.db, &video_id, index)
        .await
        .log_500("history: removing highlight failed")?
        .map(|highlights| Json(HighlightsResponse { highlights }))
        .ok_or_else(|| ApiError::not_found("No summary exists for this video."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_to_50() {
        assert_eq!(validate_limit(None).unwrap(), 50);
    }

    #[test]
    fn limit_accepts_bounds() {
        assert_eq!(validate_limit(Some(1)).unwrap(), 1);
        assert_eq!(validate_limit(Some(100)).unwrap(), 100);
    }

    #[test]
    fn limit_rejects_out_of_range_values() {
        assert!(validate_limit(Some(0)).is_err());
        assert!(validate_limit(Some(101)).is_err());
        assert!(validate_limit(Some(-5)).is_err());
    }

    #[test]
    fn range_requires_positive_width() {
        assert!(validate_range(10, 20).is_ok());
        assert!(validate_range(0, 1).is_ok());
        assert!(validate_range(10, 10).is_err());
        assert!(validate_range(20, 10).is_err());
        assert!(validate_range(-1, 5).is_err());
    }
}
