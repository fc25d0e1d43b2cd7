use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct LessonCompletion {
    pub lesson_id: String,
    pub correct: i32,
    pub total: i32,
    pub completed_at: DateTime<Utc>,
}

/// Record a completed lesson's first-attempt score.
pub async fn record_completion(
    pool: &PgPool,
    lesson_id: &str,
    correct: i32,
    total: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO lesson_progress (lesson_id, correct, total)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(lesson_id)
    .bind(correct)
    .bind(total)
    .execute(pool)
    .await?;
    Ok(())
}

/// Completed-lesson history, newest first.
pub async fn list_completions(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<LessonCompletion>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, i32, i32, DateTime<Utc>)>(
        r#"
        SELECT lesson_id, correct, total, completed_at
        FROM lesson_progress
        ORDER BY completed_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(lesson_id, correct, total, completed_at)| LessonCompletion {
            lesson_id,
            correct,
            total,
            completed_at,
        })
        .collect())
}
