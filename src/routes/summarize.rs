//! Summary creation endpoint
//!
//! The one primary-path write in the API. A stored record short-circuits the
//! whole pipeline; otherwise transcript retrieval and summarization must
//! succeed, while metadata lookup and persistence are degraded-but-200
//! concerns (the latter flagged through `storage_warning`).

use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::domain::videos;
use crate::models::{Highlight, SummaryStats, VideoMetadata, VideoRecord};
use crate::services::error::ApiError;
use crate::services::summarizer;
use crate::services::transcript::calculate_duration;
use crate::services::youtube;

const DEFAULT_LENGTH_PERCENT: i64 = 25;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/summarize", post(summarize_video))
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub url: String,
    pub length_percent: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub transcript: String,
    pub metadata: VideoMetadata,
    pub storage_warning: bool,
    pub stats: Option<SummaryStats>,
    pub highlights: Vec<Highlight>,
}

fn validate_length_percent(raw: Option<i64>) -> Result<i64, ApiError> {
    let value = raw.unwrap_or(DEFAULT_LENGTH_PERCENT);
    if !(10..=50).contains(&value) || value % 5 != 0 {
        return Err(ApiError::validation(
            "length_percent must be between 10 and 50 in steps of 5",
        ));
    }
    Ok(value)
}

/// POST /api/summarize - Create or fetch the stored summary for a video URL
async fn summarize_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let video_id = youtube::extract_video_id(&req.url)?;
    let length_percent = validate_length_percent(req.length_percent)?;

    // Cache check. A failed read is treated as a miss: the primary path must
    // not fail on storage problems.
    match videos::get_live(&state.db, &video_id).await {
        Ok(Some(record)) => return Ok(Json(cached_response(record))),
        Ok(None) => {}
        Err(err) => tracing::warn!("summarize: cache lookup failed for {video_id}: {err}"),
    }

    let (full_text, segments) = state.transcript.fetch(&video_id).await?;
    let word_count = full_text.split_whitespace().count();

    let started = Instant::now();
    let outcome = summarizer::generate_summary(&state.openai, &full_text, word_count, length_percent)
        .await
        .map_err(|err| {
            tracing::error!("summarize: generation failed for {video_id}: {err}");
            ApiError::summarization_failed()
        })?;
    let generation_seconds = started.elapsed().as_secs_f64();

    let mut metadata = youtube::get_video_metadata(&state.http, &video_id).await;
    metadata.duration_seconds = calculate_duration(&segments);

    let stats = SummaryStats {
        chars_in: full_text.chars().count() as i64,
        chars_out: outcome.content.chars().count() as i64,
        total_tokens: outcome.prompt_tokens + outcome.completion_tokens,
        generation_seconds,
    };

    // The stored row wins over this request's freshly computed content: if a
    // concurrent request created the record first, every caller sees the
    // same persisted summary.
    let (summary, transcript, highlights, storage_warning) = match videos::create_if_absent(
        &state.db,
        &video_id,
        metadata.title.as_deref(),
        metadata.thumbnail_url.as_deref(),
        &outcome.content,
        &full_text,
    )
    .await
    {
        Ok(record) => (record.summary, record.transcript, record.highlights, false),
        Err(err) => {
            tracing::error!("summarize: failed to persist record for {video_id}: {err}");
            (outcome.content, full_text, Vec::new(), true)
        }
    };

    Ok(Json(SummarizeResponse {
        summary,
        transcript,
        metadata,
        storage_warning,
        stats: Some(stats),
        highlights,
    }))
}

fn cached_response(record: VideoRecord) -> SummarizeResponse {
    let metadata = VideoMetadata {
        video_id: record.video_id,
        title: record.title,
        channel_name: None,
        duration_seconds: None,
        thumbnail_url: record.thumbnail_url,
    };

    SummarizeResponse {
        summary: record.summary,
        transcript: record.transcript,
        metadata,
        storage_warning: false,
        stats: None,
        highlights: record.highlights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_percent_defaults_to_25() {
        assert_eq!(validate_length_percent(None).unwrap(), 25);
    }

    #[test]
    fn length_percent_accepts_bounds() {
        assert_eq!(validate_length_percent(Some(10)).unwrap(), 10);
        assert_eq!(validate_length_percent(Some(50)).unwrap(), 50);
    }

    #[test]
    fn length_percent_rejects_out_of_range_values() {
        assert!(validate_length_percent(Some(5)).is_err());
        assert!(validate_length_percent(Some(55)).is_err());
    }

    #[test]
    fn length_percent_rejects_non_multiples_of_5() {
        assert!(validate_length_percent(Some(23)).is_err());
    }
}
