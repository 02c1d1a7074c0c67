//! Startup schema management for the summaries table
//!
//! Runs once in `main` before any route is reachable. Creates the base table
//! shape, then adds each later-introduced column if it is missing, so
//! repeated startups are no-ops. A failure here is fatal: the record store's
//! decode logic assumes all columns exist.

use sqlx::PgPool;

/// Optional columns added after the initial table shape shipped. Each entry
/// is (column name, column definition).
const OPTIONAL_COLUMNS: [(&str, &str); 4] = [
    ("fallacy_analysis", "TEXT"),
    ("highlights", "TEXT"),
    ("qa_history", "TEXT"),
    ("deleted_at", "TIMESTAMPTZ"),
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS summaries (
            id            BIGSERIAL    PRIMARY KEY,
            video_id      TEXT         NOT NULL UNIQUE,
            title         TEXT,
            thumbnail_url TEXT,
            summary       TEXT         NOT NULL,
            transcript    TEXT         NOT NULL,
            created_at    TIMESTAMPTZ  NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (column, definition) in OPTIONAL_COLUMNS {
        add_column_if_missing(pool, column, definition).await?;
    }

    Ok(())
}

async fn add_column_if_missing(
    pool: &PgPool,
    column: &str,
    definition: &str,
) -> Result<(), sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_name = 'summaries' AND column_name = $1
        )
        "#,
    )
    .bind(column)
    .fetch_one(pool)
    .await?;

    if exists {
        return Ok(());
    }

    // Column names come from the compile-time list above, never from input.
    let statement = format!("ALTER TABLE summaries ADD COLUMN {column} {definition}");
    sqlx::query(&statement).execute(pool).await?;
    tracing::info!("schema: added column summaries.{column}");

    Ok(())
}
