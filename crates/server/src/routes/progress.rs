use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::db::progress;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct ProgressQuery {
    pub limit: Option<i64>,
}

/// GET /api/progress
/// Completed-lesson history with first-attempt scores, newest first.
pub async fn get_progress(
    Extension(pool): Extension<PgPool>,
    Query(q): Query<ProgressQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    let completions = progress::list_completions(&pool, limit).await?;

    let rows: Vec<JsonValue> = completions
        .into_iter()
        .map(|c| {
            serde_json::json!({
                "lesson_id": c.lesson_id,
                "correct": c.correct,
                "total": c.total,
                "completed_at": c.completed_at,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "completions": rows })))
}
