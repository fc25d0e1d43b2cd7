use axum::{extract::Query, Extension, Json};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use lesson_engine::BatchCriteria;
use tactics_core::puzzle::RawPuzzle;

use crate::clients::feed::PuzzleFeedClient;
use crate::config::Config;
use crate::db::puzzles;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct BatchQuery {
    /// Comma-separated required themes.
    pub themes: Option<String>,
    /// Comma-separated excluded themes.
    pub exclude: Option<String>,
    /// Comma-separated mixed-practice subset (any-of).
    pub any: Option<String>,
    pub rating_min: Option<i32>,
    pub rating_max: Option<i32>,
    pub min_plays: Option<i64>,
    pub piece: Option<String>,
    pub limit: Option<i64>,
}

fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

impl BatchQuery {
    pub fn criteria(&self) -> BatchCriteria {
        BatchCriteria {
            themes_all: split_tags(self.themes.as_deref()),
            themes_none: split_tags(self.exclude.as_deref()),
            themes_any: split_tags(self.any.as_deref()),
            rating_min: self.rating_min,
            rating_max: self.rating_max,
            min_plays: self.min_plays,
            piece: self.piece.as_ref().map(|p| p.to_lowercase()),
        }
    }
}

/// GET /api/puzzles?themes=fork&rating_min=1000&rating_max=1600
pub async fn get_puzzles(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Query(q): Query<BatchQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let limit = q.limit.unwrap_or(config.lesson_batch_size).clamp(1, 500);
    let batch = puzzles::fetch_batch(&pool, &q.criteria(), limit).await?;

    if batch.is_empty() {
        return Err(AppError::NotFound(
            "No puzzles matched the lesson criteria".to_string(),
        ));
    }

    let total = batch.len();
    Ok(Json(serde_json::json!({
        "puzzles": batch,
        "total": total,
    })))
}

/// GET /api/puzzles/themes
pub async fn get_themes(
    Extension(pool): Extension<PgPool>,
) -> Result<Json<JsonValue>, AppError> {
    let themes = puzzles::list_themes(&pool).await?;
    Ok(Json(serde_json::json!({ "themes": themes })))
}

#[derive(Deserialize)]
pub struct UploadBody {
    pub puzzles: Vec<RawPuzzle>,
}

/// POST /api/admin/puzzles/upload
/// Upsert a materialized puzzle batch.
pub async fn upload_puzzles(
    Extension(pool): Extension<PgPool>,
    Json(body): Json<UploadBody>,
) -> Result<Json<JsonValue>, AppError> {
    if body.puzzles.is_empty() {
        return Err(AppError::BadRequest("Empty puzzle batch".to_string()));
    }
    let count = puzzles::upsert_puzzles(&pool, &body.puzzles).await?;
    Ok(Json(serde_json::json!({ "uploaded": count })))
}

#[derive(Deserialize)]
pub struct ImportQuery {
    pub count: Option<usize>,
}

/// POST /api/admin/puzzles/import
/// Pull a batch from the configured NDJSON feed and upsert it.
pub async fn import_puzzles(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Query(q): Query<ImportQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let Some(feed_url) = config.puzzle_feed_url.as_deref() else {
        return Err(AppError::BadRequest(
            "PUZZLE_FEED_URL is not configured".to_string(),
        ));
    };

    let count = q.count.unwrap_or(100).min(5000);
    let client = PuzzleFeedClient::new(feed_url);
    let fetched = client
        .fetch_batch(count)
        .await
        .map_err(AppError::Internal)?;

    let imported = puzzles::upsert_puzzles(&pool, &fetched).await?;
    tracing::info!(imported, "puzzle feed import finished");
    Ok(Json(serde_json::json!({ "imported": imported })))
}
