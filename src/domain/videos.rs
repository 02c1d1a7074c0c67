//! Videos domain - DB queries for the summaries table
//!
//! The only module that reads or writes the persisted video records.
//! Single-statement queries use the generic Executor pattern, allowing them
//! to work with both `&PgPool` and `&mut PgConnection` (transactions).
//! Operations spanning multiple statements (`create_if_absent`, the
//! highlight read-merge-write cycle) take `&PgPool` and manage their own
//! connection or transaction.

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::highlights;
use crate::models::{FallacyAnalysisResult, Highlight, HistoryItem, QaMessage, VideoRecord};

/// Raw row shape. The three structured columns stay TEXT-serialized JSON in
/// the database and are decoded by `decode_row`.
#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: i64,
    video_id: String,
    title: Option<String>,
    thumbnail_url: Option<String>,
    summary: String,
    transcript: String,
    fallacy_analysis: Option<String>,
    highlights: Option<String>,
    qa_history: Option<String>,
    created_at: DateTime<Utc>,
}

const RECORD_COLUMNS: &str = "id, video_id, title, thumbnail_url, summary, transcript, \
     fallacy_analysis, highlights, qa_history, created_at";

const PROJECTION_COLUMNS: &str = "video_id, title, thumbnail_url, summary, \
     fallacy_analysis IS NOT NULL AS has_fallacy_analysis, created_at";

/// Decode a row into the typed entity. Default policy for the structured
/// columns lives here and nowhere else: highlights and qa_history fall back
/// to empty when unset or unparseable, fallacy_analysis to None.
fn decode_row(row: VideoRow) -> VideoRecord {
    VideoRecord {
        id: row.id,
        video_id: row.video_id,
        title: row.title,
        thumbnail_url: row.thumbnail_url,
        summary: row.summary,
        transcript: row.transcript,
        fallacy_analysis: row
            .fallacy_analysis
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok()),
        highlights: parse_or_default(row.highlights.as_deref()),
        qa_history: parse_or_default(row.qa_history.as_deref()),
        created_at: row.created_at,
    }
}

fn parse_or_default<T>(raw: Option<&str>) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    raw.and_then(|r| serde_json::from_str(r).ok())
        .unwrap_or_default()
}

fn to_json_text<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .unwrap_or(serde_json::Value::Null)
        .to_string()
}

/// Insert a new record unless one already exists for this video_id (live or
/// deleted), then return the row's current content either way. The unique
/// constraint on video_id is the sole mutual-exclusion mechanism: under
/// concurrent calls exactly one insert wins and every caller sees the same
/// stored row. Both statements run on one connection so the follow-up read
/// observes the insert.
pub async fn create_if_absent(
    pool: &PgPool,
    video_id: &str,
    title: Option<&str>,
    thumbnail_url: Option<&str>,
    summary: &str,
    transcript: &str,
) -> Result<VideoRecord, sqlx::Error> {
    let mut conn = pool.acquire().await?;

    sqlx::query(
        r#"
        INSERT INTO summaries (video_id, title, thumbnail_url, summary, transcript)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (video_id) DO NOTHING
        "#,
    )
    .bind(video_id)
    .bind(title)
    .bind(thumbnail_url)
    .bind(summary)
    .bind(transcript)
    .execute(&mut *conn)
    .await?;

    let row: VideoRow = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM summaries WHERE video_id = $1"
    ))
    .bind(video_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(decode_row(row))
}

/// Fetch the record for a video_id, live rows only.
pub async fn get_live<'e, E>(
    executor: E,
    video_id: &str,
) -> Result<Option<VideoRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: Option<VideoRow> = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM summaries WHERE video_id = $1 AND deleted_at IS NULL"
    ))
    .bind(video_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(decode_row))
}

/// List the most recent live records, newest first, id as tiebreaker.
/// `limit` is caller-validated.
pub async fn list_recent<'e, E>(executor: E, limit: i64) -> Result<Vec<HistoryItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        SELECT {PROJECTION_COLUMNS}
        FROM summaries
        WHERE deleted_at IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT $1
        "#
    ))
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Store a fallacy analysis, but only if none is stored yet. This is the
/// write-once enforcement point: the conditional WHERE makes concurrent
/// callers see at most one success. Returns whether the write took effect.
pub async fn save_fallacy_analysis<'e, E>(
    executor: E,
    video_id: &str,
    analysis: &FallacyAnalysisResult,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE summaries SET fallacy_analysis = $2
        WHERE video_id = $1 AND fallacy_analysis IS NULL AND deleted_at IS NULL
        "#,
    )
    .bind(video_id)
    .bind(to_json_text(analysis))
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Read a stored fallacy analysis regardless of live/deleted status, so the
/// analysis endpoint can short-circuit before fetching a transcript.
pub async fn get_fallacy_analysis<'e, E>(
    executor: E,
    video_id: &str,
) -> Result<Option<FallacyAnalysisResult>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT fallacy_analysis FROM summaries WHERE video_id = $1")
            .bind(video_id)
            .fetch_optional(executor)
            .await?;

    Ok(row
        .and_then(|(raw,)| raw)
        .and_then(|raw| serde_json::from_str(&raw).ok()))
}

/// Replace the stored Q&A history wholesale. Silently a no-op for missing or
/// deleted records; callers treat this as best-effort.
pub async fn save_qa_history<'e, E>(
    executor: E,
    video_id: &str,
    history: &[QaMessage],
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        UPDATE summaries SET qa_history = $2
        WHERE video_id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(video_id)
    .bind(to_json_text(&history))
    .execute(executor)
    .await?;

    Ok(())
}

/// Soft-delete a live record. Returns whether a row was affected.
pub async fn soft_delete<'e, E>(executor: E, video_id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        "UPDATE summaries SET deleted_at = now() WHERE video_id = $1 AND deleted_at IS NULL",
    )
    .bind(video_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Restore a soft-deleted record. Returns the restored projection, or None
/// when the record is not currently deleted (never existed or already live).
pub async fn restore<'e, E>(
    executor: E,
    video_id: &str,
) -> Result<Option<HistoryItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        UPDATE summaries SET deleted_at = NULL
        WHERE video_id = $1 AND deleted_at IS NOT NULL
        RETURNING {PROJECTION_COLUMNS}
        "#
    ))
    .bind(video_id)
    .fetch_optional(executor)
    .await
}

/// Append a range to a live record's highlights and persist the merged
/// result. The whole read-merge-write cycle runs in one transaction with the
/// row locked, so concurrent highlight edits on the same video serialize
/// instead of losing updates. Returns None when the video has no live record.
pub async fn add_highlight(
    pool: &PgPool,
    video_id: &str,
    start: i64,
    end: i64,
) -> Result<Option<Vec<Highlight>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(mut ranges) = lock_highlights(&mut tx, video_id).await? else {
        return Ok(None);
    };

    ranges.push(Highlight { start, end });
    let merged = highlights::merge(ranges);

    persist_highlights(&mut tx, video_id, &merged).await?;
    tx.commit().await?;

    Ok(Some(merged))
}

/// Remove the range at `index` from a live record's highlights. Removal
/// cannot create new overlaps, so no re-merge is needed. An out-of-range
/// index is a no-op on the list, which is still persisted and returned
/// unchanged. Returns None only for missing or deleted records.
pub async fn remove_highlight(
    pool: &PgPool,
    video_id: &str,
    index: usize,
) -> Result<Option<Vec<Highlight>>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let Some(mut ranges) = lock_highlights(&mut tx, video_id).await? else {
        return Ok(None);
    };

    if index < ranges.len() {
        ranges.remove(index);
    }

    persist_highlights(&mut tx, video_id, &ranges).await?;
    tx.commit().await?;

    Ok(Some(ranges))
}

/// Read and row-lock the highlight list of a live record.
async fn lock_highlights(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    video_id: &str,
) -> Result<Option<Vec<Highlight>>, sqlx::Error> {
    let row: Option<(Option<String>,)> = sqlx::query_as(
        "SELECT highlights FROM summaries WHERE video_id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(video_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(|(raw,)| parse_or_default(raw.as_deref())))
}

async fn persist_highlights(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    video_id: &str,
    ranges: &[Highlight],
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE summaries SET highlights = $2 WHERE video_id = $1")
        .bind(video_id)
        .bind(to_json_text(&ranges))
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_row() -> VideoRow {
        VideoRow {
            id: 1,
            video_id: "dQw4w9WgXcQ".to_string(),
            title: Some("Test Video".to_string()),
            thumbnail_url: None,
            summary: "Test summary".to_string(),
            transcript: "Test transcript".to_string(),
            fallacy_analysis: None,
            highlights: None,
            qa_history: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn decode_defaults_unset_structured_fields() {
        let record = decode_row(base_row());

        assert!(record.fallacy_analysis.is_none());
        assert!(record.highlights.is_empty());
        assert!(record.qa_history.is_empty());
    }

    #[test]
    fn decode_parses_stored_highlights_and_history() {
        let mut row = base_row();
        row.highlights = Some(r#"[{"start":10,"end":25}]"#.to_string());
        row.qa_history =
            Some(r#"[{"role":"user","content":"What is this video about?"}]"#.to_string());

        let record = decode_row(row);

        assert_eq!(record.highlights, vec![Highlight { start: 10, end: 25 }]);
        assert_eq!(record.qa_history.len(), 1);
        assert_eq!(record.qa_history[0].role, "user");
    }

    #[test]
    fn decode_treats_malformed_json_as_unset() {
        let mut row = base_row();
        row.highlights = Some("not json".to_string());
        row.fallacy_analysis = Some("{\"broken\":".to_string());

        let record = decode_row(row);

        assert!(record.highlights.is_empty());
        assert!(record.fallacy_analysis.is_none());
    }

    #[test]
    fn decode_parses_stored_fallacy_analysis() {
        let mut row = base_row();
        row.fallacy_analysis = Some(
            r#"{
                "summary": {
                    "total_fallacies": 1,
                    "high_severity": 1,
                    "medium_severity": 0,
                    "low_severity": 0,
                    "primary_tactics": ["Ad Hominem"]
                },
                "fallacies": [{
                    "timestamp": null,
                    "quote": "you would say that",
                    "fallacy_name": "Ad Hominem",
                    "category": "Relevance",
                    "severity": "high",
                    "explanation": "Attacks the speaker instead of the claim.",
                    "clear_example": {
                        "scenario": "Dismissing a doctor's advice because of their accent.",
                        "why_wrong": "The accent has no bearing on the advice."
                    }
                }]
            }"#
            .to_string(),
        );

        let record = decode_row(row);

        let analysis = record.fallacy_analysis.expect("analysis should decode");
        assert_eq!(analysis.summary.total_fallacies, 1);
        assert_eq!(analysis.fallacies[0].fallacy_name, "Ad Hominem");
    }

    #[test]
    fn highlight_list_round_trips_through_json_text() {
        let ranges = vec![Highlight { start: 0, end: 5 }, Highlight { start: 9, end: 12 }];
        let encoded = to_json_text(&ranges);
        let decoded: Vec<Highlight> = parse_or_default(Some(&encoded));

        assert_eq!(decoded, ranges);
    }
}
