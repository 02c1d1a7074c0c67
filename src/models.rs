//! Shared data models used across modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A highlighted range over the transcript. Ranges that touch
/// (`a.end == b.start`) are considered one range by the merge engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub start: i64,
    pub end: i64,
}

/// One message in a video's question-answering conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearExample {
    pub scenario: String,
    pub why_wrong: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallacy {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub quote: String,
    pub fallacy_name: String,
    pub category: String,
    pub severity: String,
    pub explanation: String,
    pub clear_example: ClearExample,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallacySummary {
    pub total_fallacies: i64,
    pub high_severity: i64,
    pub medium_severity: i64,
    pub low_severity: i64,
    pub primary_tactics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallacyAnalysisResult {
    pub summary: FallacySummary,
    pub fallacies: Vec<Fallacy>,
}

/// Video metadata from the YouTube oEmbed endpoint plus a duration estimate
/// derived from the transcript segments.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: Option<String>,
    pub channel_name: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnail_url: Option<String>,
}

impl VideoMetadata {
    /// Metadata with only the video id filled in, for when the oEmbed
    /// lookup fails.
    pub fn bare(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: None,
            channel_name: None,
            duration_seconds: None,
            thumbnail_url: None,
        }
    }
}

/// Generation counters reported alongside a freshly computed summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub chars_in: i64,
    pub chars_out: i64,
    pub total_tokens: i64,
    pub generation_seconds: f64,
}

/// The durable per-video entity. `deleted_at` stays internal to the record
/// store and is never serialized to clients.
#[derive(Debug, Clone, Serialize)]
pub struct VideoRecord {
    pub id: i64,
    pub video_id: String,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub summary: String,
    pub transcript: String,
    pub fallacy_analysis: Option<FallacyAnalysisResult>,
    pub highlights: Vec<Highlight>,
    pub qa_history: Vec<QaMessage>,
    pub created_at: DateTime<Utc>,
}

/// Compact projection of a record for history listings and restore results.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryItem {
    pub video_id: String,
    pub title: Option<String>,
    pub thumbnail_url: Option<String>,
    pub summary: String,
    pub has_fallacy_analysis: bool,
    pub created_at: DateTime<Utc>,
}

/// Error payload shared by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub details: Option<String>,
}
