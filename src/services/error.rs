//! Error handling utilities for route handlers

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::ErrorResponse;
use crate::services::transcript::TranscriptError;
use crate::services::youtube::UrlError;

/// An error a handler returns to the client: a status code plus the shared
/// `{error, message, details}` payload.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn summarization_failed() -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "summarization_failed",
            "Unable to generate summary at this time. Please try again later.",
        )
    }

    pub fn analysis_failed() -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "analysis_failed",
            "Unable to analyze fallacies at this time. Please try again later.",
        )
    }

    pub fn qa_failed() -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "qa_failed",
            "Unable to answer the question at this time. Please try again later.",
        )
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "An unexpected error occurred. Please try again.",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<UrlError> for ApiError {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::Playlist => {
                Self::new(StatusCode::BAD_REQUEST, "playlist_not_supported", err.to_string())
            }
            UrlError::Empty => Self::new(StatusCode::BAD_REQUEST, "invalid_url", err.to_string()),
            UrlError::Invalid => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_url", err.to_string()).with_details(
                    "Supported formats: youtube.com/watch?v=..., \
                     youtu.be/..., youtube.com/shorts/...",
                )
            }
        }
    }
}

impl From<TranscriptError> for ApiError {
    fn from(err: TranscriptError) -> Self {
        match err {
            TranscriptError::VideoUnavailable => Self::new(
                StatusCode::NOT_FOUND,
                "video_not_found",
                "The video could not be found. It may have been removed or \
                 the URL may be incorrect.",
            ),
            TranscriptError::TranscriptsDisabled | TranscriptError::NoTranscriptFound => {
                Self::new(
                    StatusCode::NOT_FOUND,
                    "transcript_unavailable",
                    "No transcript is available for this video. Try a different \
                     video that has captions enabled.",
                )
            }
            other => {
                tracing::error!("transcript retrieval failed: {other}");
                Self::internal()
            }
        }
    }
}

/// Extension trait for logging errors and converting to ApiError
pub trait LogErr<T> {
    /// Log the error with context and return a generic 500
    fn log_500(self, context: &str) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_500(self, context: &str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{context}: {e}");
            ApiError::internal()
        })
    }
}
