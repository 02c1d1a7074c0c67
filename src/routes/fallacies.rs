//! Fallacy analysis endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;

use crate::AppState;
use crate::domain::videos;
use crate::models::FallacyAnalysisResult;
use crate::services::error::ApiError;
use crate::services::fallacy;
use crate::services::youtube;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/fallacies", post(analyze_video))
}

#[derive(Debug, Deserialize)]
pub struct FallacyAnalysisRequest {
    pub url: String,
}

/// POST /api/fallacies - Analyze a video transcript for logical fallacies
///
/// The stored analysis is checked before any transcript retrieval, deleted
/// records included: the analysis belongs to the video content, not to the
/// record's visibility in history.
async fn analyze_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FallacyAnalysisRequest>,
) -> Result<Json<FallacyAnalysisResult>, ApiError> {
    let video_id = youtube::extract_video_id(&req.url)?;

    match videos::get_fallacy_analysis(&state.db, &video_id).await {
        Ok(Some(stored)) => return Ok(Json(stored)),
        Ok(None) => {}
        Err(err) => tracing::warn!("fallacies: cache lookup failed for {video_id}: {err}"),
    }

    let (full_text, _segments) = state.transcript.fetch(&video_id).await?;

    let analysis = fallacy::analyze_fallacies(&state.openai, &full_text)
        .await
        .ok_or_else(ApiError::analysis_failed)?;

    // Best-effort persistence. A false return means another request won the
    // write-once race or there is no record to attach the analysis to.
    match videos::save_fallacy_analysis(&state.db, &video_id, &analysis).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!("fallacies: analysis for {video_id} not stored (already present or no record)")
        }
        Err(err) => tracing::warn!("fallacies: failed to store analysis for {video_id}: {err}"),
    }

    Ok(Json(analysis))
}
