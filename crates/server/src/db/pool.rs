use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run the full Postgres schema migration inline.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Puzzle corpus (already materialized by the curation pipeline)
CREATE TABLE IF NOT EXISTS puzzles (
    id         TEXT PRIMARY KEY,
    fen        TEXT NOT NULL,
    moves      TEXT[] NOT NULL,
    rating     INTEGER NOT NULL,
    themes     TEXT[] NOT NULL DEFAULT '{}',
    piece      TEXT,
    plays      BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_puzzles_rating ON puzzles (rating);
CREATE INDEX IF NOT EXISTS idx_puzzles_plays  ON puzzles (plays DESC);
CREATE INDEX IF NOT EXISTS idx_puzzles_themes ON puzzles USING GIN (themes);
CREATE INDEX IF NOT EXISTS idx_puzzles_piece  ON puzzles (piece);

-- Completed lessons with their first-attempt scores
CREATE TABLE IF NOT EXISTS lesson_progress (
    id           BIGSERIAL PRIMARY KEY,
    lesson_id    TEXT NOT NULL,
    correct      INTEGER NOT NULL,
    total        INTEGER NOT NULL,
    completed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_lesson_progress_lesson
    ON lesson_progress (lesson_id, completed_at DESC);
"#;
