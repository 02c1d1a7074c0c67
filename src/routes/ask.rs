//! Q&A endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::domain::videos;
use crate::models::QaMessage;
use crate::services::error::ApiError;
use crate::services::qa;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ask", post(ask))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub transcript: String,
    pub question: String,
    #[serde(default)]
    pub history: Vec<QaMessage>,
    pub video_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// POST /api/ask - Answer a question about a transcript
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::validation("question must not be empty"));
    }

    let answer = qa::ask_question(&state.openai, &req.transcript, question, &req.history)
        .await
        .map_err(|err| {
            tracing::error!("qa: chat completion failed: {err}");
            ApiError::qa_failed()
        })?;

    // Persist the running conversation when the client names a stored video.
    // Fire-and-forget: a failed write never fails the answer.
    if let Some(video_id) = &req.video_id {
        let mut history = req.history;
        history.push(QaMessage {
            role: "user".to_string(),
            content: question.to_string(),
        });
        history.push(QaMessage {
            role: "assistant".to_string(),
            content: answer.clone(),
        });

        if let Err(err) = videos::save_qa_history(&state.db, video_id, &history).await {
            tracing::warn!("qa: failed to persist history for {video_id}: {err}");
        }
    }

    Ok(Json(AskResponse { answer }))
}
