//! YouTube URL parsing and oEmbed metadata lookup

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::models::VideoMetadata;

/// Matches the 11-character video id in watch, short-link, and shorts URLs
/// (including the m. and music. subdomains).
static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/(?:watch\?.*v=|shorts/)|youtu\.be/)([a-zA-Z0-9_-]{11})")
        .expect("video id regex is valid")
});

const OEMBED_BASE: &str = "https://www.youtube.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("URL must not be empty")]
    Empty,
    #[error("Playlist URLs are not supported. Please provide a single video URL.")]
    Playlist,
    #[error("The provided URL is not a valid YouTube video URL.")]
    Invalid,
}

/// Extract a YouTube video id from a URL.
///
/// Supports youtube.com/watch, youtu.be, and youtube.com/shorts formats.
/// Playlist-only URLs (a `/playlist` path, or `list=` without `v=`) get a
/// distinct error so the API can explain they are unsupported.
pub fn extract_video_id(url: &str) -> Result<String, UrlError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlError::Empty);
    }

    if is_playlist_only(url) {
        return Err(UrlError::Playlist);
    }

    VIDEO_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or(UrlError::Invalid)
}

fn is_playlist_only(raw: &str) -> bool {
    let Ok(parsed) = Url::parse(raw) else {
        return false;
    };

    if parsed.path() == "/playlist" {
        return true;
    }

    let mut has_list = false;
    let mut has_video = false;
    for (key, _) in parsed.query_pairs() {
        match key.as_ref() {
            "list" => has_list = true,
            "v" => has_video = true,
            _ => {}
        }
    }

    has_list && !has_video
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

/// Retrieve video metadata from the YouTube oEmbed endpoint.
///
/// Never fails: any transport or decode problem logs a warning and yields
/// metadata carrying only the video id.
pub async fn get_video_metadata(http: &reqwest::Client, video_id: &str) -> VideoMetadata {
    get_video_metadata_from(http, OEMBED_BASE, video_id).await
}

pub(crate) async fn get_video_metadata_from(
    http: &reqwest::Client,
    base: &str,
    video_id: &str,
) -> VideoMetadata {
    let video_url = format!("https://www.youtube.com/watch?v={video_id}");
    let oembed_url = format!("{base}/oembed?url={video_url}&format=json");

    let data: Option<OEmbedResponse> = match http.get(&oembed_url).send().await {
        Ok(response) => match response.error_for_status() {
            Ok(response) => response.json().await.ok(),
            Err(_) => None,
        },
        Err(_) => None,
    };

    match data {
        Some(data) => VideoMetadata {
            video_id: video_id.to_string(),
            title: data.title,
            channel_name: data.author_name,
            duration_seconds: None,
            thumbnail_url: data.thumbnail_url,
        },
        None => {
            tracing::warn!("failed to fetch oEmbed metadata for {video_id}");
            VideoMetadata::bare(video_id)
        }
    }
}
