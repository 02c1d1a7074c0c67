//! Transcript retrieval from YouTube's caption tracks
//!
//! Fetches the watch page, locates the caption track list embedded in the
//! player payload, and downloads the chosen track in JSON3 format. The named
//! error conditions mirror what the watch page can tell us: the video is
//! gone, captions are disabled, or no usable track exists.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

const WATCH_BASE: &str = "https://www.youtube.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("the video is unavailable")]
    VideoUnavailable,
    #[error("subtitles are disabled for this video")]
    TranscriptsDisabled,
    #[error("no transcript could be found for this video")]
    NoTranscriptFound,
    #[error("transcript request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not parse caption data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One time-coded transcript segment. `start` and `duration` are seconds.
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Estimate video duration from the last segment's start + duration.
pub fn calculate_duration(segments: &[Segment]) -> Option<i64> {
    let last = segments.last()?;
    Some((last.start + last.duration) as i64)
}

#[derive(Clone)]
pub struct TranscriptClient {
    http: Client,
    watch_base: String,
}

impl TranscriptClient {
    pub fn new() -> Self {
        Self::with_base_url(WATCH_BASE)
    }

    pub fn with_base_url(base: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build transcript HTTP client");

        Self {
            http,
            watch_base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Retrieve the transcript for a video id.
    ///
    /// Returns the full text (segment texts joined with spaces) together
    /// with the time-coded segments.
    pub async fn fetch(
        &self,
        video_id: &str,
    ) -> Result<(String, Vec<Segment>), TranscriptError> {
        let watch_url = format!("{}/watch?v={}", self.watch_base, video_id);
        let page = self
            .http
            .get(&watch_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if page.contains(r#""status":"ERROR""#) {
            return Err(TranscriptError::VideoUnavailable);
        }

        let tracks = extract_caption_tracks(&page)?;
        if tracks.is_empty() {
            return Err(TranscriptError::NoTranscriptFound);
        }

        let track = pick_track(&tracks);
        let separator = if track.base_url.contains('?') { '&' } else { '?' };
        let track_url = format!("{}{}fmt=json3", track.base_url, separator);

        let raw = self
            .http
            .get(&track_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_json3(&raw)?;
        if segments.is_empty() {
            return Err(TranscriptError::NoTranscriptFound);
        }

        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok((full_text, segments))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    // "asr" marks an auto-generated track
    #[serde(default)]
    kind: Option<String>,
}

/// Locate the `captionTracks` array in the watch-page payload. A page
/// without the key means captions are disabled for the video.
fn extract_caption_tracks(page: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let key = r#""captionTracks":"#;
    let Some(pos) = page.find(key) else {
        return Err(TranscriptError::TranscriptsDisabled);
    };

    let rest = &page[pos + key.len()..];
    let json = take_json_array(rest).ok_or(TranscriptError::TranscriptsDisabled)?;

    Ok(serde_json::from_str(json)?)
}

/// Take the leading JSON array out of `s`, scanning bracket depth while
/// honoring string literals and escapes.
fn take_json_array(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Prefer a manually-authored English track, then any English track, then
/// whatever comes first.
fn pick_track(tracks: &[CaptionTrack]) -> &CaptionTrack {
    tracks
        .iter()
        .find(|t| t.language_code.starts_with("en") && t.kind.is_none())
        .or_else(|| tracks.iter().find(|t| t.language_code.starts_with("en")))
        .unwrap_or(&tracks[0])
}

#[derive(Debug, Deserialize)]
struct Json3Body {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    t_start_ms: Option<i64>,
    #[serde(rename = "dDurationMs")]
    d_duration_ms: Option<i64>,
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

fn parse_json3(raw: &str) -> Result<Vec<Segment>, serde_json::Error> {
    let body: Json3Body = serde_json::from_str(raw)?;

    let mut segments = Vec::new();
    for event in body.events {
        let Some(segs) = event.segs else {
            continue;
        };

        let text: String = segs.iter().map(|s| s.utf8.as_str()).collect();
        let text = text.replace('\n', " ").trim().to_string();
        if text.is_empty() {
            continue;
        }

        segments.push(Segment {
            text,
            start: event.t_start_ms.unwrap_or(0) as f64 / 1000.0,
            duration: event.d_duration_ms.unwrap_or(0) as f64 / 1000.0,
        });
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JSON3_BODY: &str = r#"{
        "events": [
            {"tStartMs": 0, "dDurationMs": 2500, "segs": [{"utf8": "Hello world"}]},
            {"tStartMs": 2500, "dDurationMs": 3000, "segs": [{"utf8": "this is "}, {"utf8": "great content"}]},
            {"tStartMs": 6000, "dDurationMs": 1000}
        ]
    }"#;

    #[test]
    fn take_json_array_handles_nested_structures() {
        let input = r#"[{"a":[1,2],"b":"x]y"},{"c":"z\"w"}] trailing"#;
        assert_eq!(
            take_json_array(input),
            Some(r#"[{"a":[1,2],"b":"x]y"},{"c":"z\"w"}]"#)
        );
    }

    #[test]
    fn take_json_array_rejects_non_array() {
        assert_eq!(take_json_array(r#"{"a":1}"#), None);
        assert_eq!(take_json_array("[1,2"), None);
    }

    #[test]
    fn parse_json3_flattens_segments_and_skips_empty_events() {
        let segments = parse_json3(JSON3_BODY).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello world");
        assert_eq!(segments[1].text, "this is great content");
        assert!((segments[1].start - 2.5).abs() < f64::EPSILON);
        assert!((segments[1].duration - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duration_uses_last_segment() {
        let segments = parse_json3(JSON3_BODY).unwrap();
        assert_eq!(calculate_duration(&segments), Some(5));
        assert_eq!(calculate_duration(&[]), None);
    }

    #[test]
    fn pick_track_prefers_manual_english() {
        let tracks: Vec<CaptionTrack> = serde_json::from_str(
            r#"[
                {"baseUrl": "http://x/de", "languageCode": "de"},
                {"baseUrl": "http://x/en-asr", "languageCode": "en", "kind": "asr"},
                {"baseUrl": "http://x/en", "languageCode": "en"}
            ]"#,
        )
        .unwrap();

        assert_eq!(pick_track(&tracks).base_url, "http://x/en");
    }

    #[test]
    fn pick_track_falls_back_to_first() {
        let tracks: Vec<CaptionTrack> = serde_json::from_str(
            r#"[
                {"baseUrl": "http://x/de", "languageCode": "de"},
                {"baseUrl": "http://x/fr", "languageCode": "fr"}
            ]"#,
        )
        .unwrap();

        assert_eq!(pick_track(&tracks).base_url, "http://x/de");
    }

    #[tokio::test]
    async fn fetch_returns_joined_text_and_segments() {
        let server = MockServer::start().await;

        let track_url = format!("{}/api/timedtext?v=dQw4w9WgXcQ", server.uri());
        let page = format!(
            r#"<html>"captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"{track_url}","languageCode":"en"}}]}}}}</html>"#
        );

        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .respond_with(ResponseTemplate::new(200).set_body_string(JSON3_BODY))
            .mount(&server)
            .await;

        let client = TranscriptClient::with_base_url(&server.uri());
        let (full_text, segments) = client.fetch("dQw4w9WgXcQ").await.unwrap();

        assert_eq!(full_text, "Hello world this is great content");
        assert_eq!(segments.len(), 2);
    }

    #[tokio::test]
    async fn fetch_reports_disabled_captions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html>no captions here</html>"),
            )
            .mount(&server)
            .await;

        let client = TranscriptClient::with_base_url(&server.uri());
        let err = client.fetch("dQw4w9WgXcQ").await.unwrap_err();

        assert!(matches!(err, TranscriptError::TranscriptsDisabled));
    }

    #[tokio::test]
    async fn fetch_reports_unavailable_video() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html>"playabilityStatus":{"status":"ERROR","reason":"Video unavailable"}</html>"#,
            ))
            .mount(&server)
            .await;

        let client = TranscriptClient::with_base_url(&server.uri());
        let err = client.fetch("gone12345678").await.unwrap_err();

        assert!(matches!(err, TranscriptError::VideoUnavailable));
    }
}
