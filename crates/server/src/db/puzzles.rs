use sqlx::PgPool;

use lesson_engine::BatchCriteria;
use tactics_core::puzzle::{self, RawPuzzle};

/// Fetch a lesson batch matching the criteria, most-played first.
pub async fn fetch_batch(
    pool: &PgPool,
    criteria: &BatchCriteria,
    limit: i64,
) -> Result<Vec<RawPuzzle>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String, Vec<String>, i32, Vec<String>, i64)>(
        r#"
        SELECT id, fen, moves, rating, themes, plays
        FROM puzzles
        WHERE themes @> $1
          AND NOT (themes && $2)
          AND (cardinality($3::text[]) = 0 OR themes && $3)
          AND ($4::int IS NULL OR rating >= $4)
          AND ($5::int IS NULL OR rating <= $5)
          AND ($6::bigint IS NULL OR plays >= $6)
          AND ($7::text IS NULL OR piece = $7)
        ORDER BY plays DESC, id
        LIMIT $8
        "#,
    )
    .bind(&criteria.themes_all)
    .bind(&criteria.themes_none)
    .bind(&criteria.themes_any)
    .bind(criteria.rating_min)
    .bind(criteria.rating_max)
    .bind(criteria.min_plays)
    .bind(&criteria.piece)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, fen, moves, rating, themes, plays)| RawPuzzle {
            id,
            fen,
            moves,
            rating,
            themes,
            plays,
        })
        .collect())
}

/// Upsert a materialized puzzle batch. The solver-piece column is
/// classified here, once, so the criteria filter is a plain equality.
pub async fn upsert_puzzles(pool: &PgPool, puzzles: &[RawPuzzle]) -> Result<usize, sqlx::Error> {
    let mut count = 0;

    for raw in puzzles {
        let piece = puzzle::prepare(raw)
            .ok()
            .and_then(|p| p.solver_piece())
            .map(tactics_core::board::role_name);

        sqlx::query(
            r#"
            INSERT INTO puzzles (id, fen, moves, rating, themes, piece, plays)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                fen = EXCLUDED.fen,
                moves = EXCLUDED.moves,
                rating = EXCLUDED.rating,
                themes = EXCLUDED.themes,
                piece = EXCLUDED.piece,
                plays = EXCLUDED.plays,
                updated_at = NOW()
            "#,
        )
        .bind(&raw.id)
        .bind(&raw.fen)
        .bind(&raw.moves)
        .bind(raw.rating)
        .bind(&raw.themes)
        .bind(piece)
        .bind(raw.plays)
        .execute(pool)
        .await?;

        count += 1;
    }

    Ok(count)
}

/// Bump play counts for every puzzle of a completed lesson.
pub async fn increment_plays(pool: &PgPool, ids: &[String]) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE puzzles
        SET plays = plays + 1, updated_at = NOW()
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(())
}

/// Distinct theme tags across the corpus, for the curriculum browser.
pub async fn list_themes(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT unnest(themes) AS theme
        FROM puzzles
        ORDER BY theme
        "#,
    )
    .fetch_all(pool)
    .await
}
