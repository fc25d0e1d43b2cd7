use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use lesson_engine::{
    AttemptOutcome, BatchCriteria, ContinueOutcome, LessonSession, MissFeedback, MoveStatus,
    Phase, ReplyKey, ReplyOutcome, TracingObserver,
};
use tactics_core::board;
use tactics_core::puzzle;
use tactics_core::CandidateMove;

use crate::config::Config;
use crate::db::{progress, puzzles};
use crate::error::AppError;
use crate::session_store::{ActiveSession, SessionStore};

#[derive(Deserialize, Validate)]
pub struct StartSessionBody {
    pub lesson_id: String,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[serde(default)]
    pub criteria: BatchCriteria,
}

/// POST /api/sessions
/// Fetch a batch for the lesson criteria, prepare it and start a session.
pub async fn start_session(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Extension(store): Extension<SessionStore>,
    Json(body): Json<StartSessionBody>,
) -> Result<Json<JsonValue>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let limit = body.limit.unwrap_or(config.lesson_batch_size);
    let raw_batch = puzzles::fetch_batch(&pool, &body.criteria, limit).await?;

    // Unplayable puzzles are dropped, not fatal — unless nothing survives.
    let mut batch = Vec::with_capacity(raw_batch.len());
    for raw in &raw_batch {
        match puzzle::prepare(raw) {
            Ok(prepared) => batch.push(prepared),
            Err(e) => {
                tracing::warn!(puzzle_id = %raw.id, error = %e, "dropping unplayable puzzle");
            }
        }
    }

    if batch.is_empty() {
        return Err(AppError::NotFound(
            "No puzzles matched the lesson criteria".to_string(),
        ));
    }

    let mut session = LessonSession::new(batch)?;
    session.observe(Box::new(TracingObserver));
    let total = session.total_puzzles();
    let state = session_view(&session);

    let session_id = store
        .insert(ActiveSession {
            lesson_id: body.lesson_id,
            session,
        })
        .await;
    tracing::info!(session_id = %session_id, total, "lesson session started");

    Ok(Json(json!({
        "session_id": session_id,
        "total_puzzles": total,
        "state": state,
    })))
}

/// GET /api/sessions/{session_id}
pub async fn get_session(
    Extension(store): Extension<SessionStore>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let entry = lookup(&store, &session_id).await?;
    let guard = entry.lock().await;
    Ok(Json(session_view(&guard.session)))
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

/// POST /api/sessions/{session_id}/moves
/// A move attempt from the board layer. On a correct non-final move the
/// recorded opponent reply is scheduled to land after the configured delay.
pub async fn play_move(
    Extension(config): Extension<Config>,
    Extension(store): Extension<SessionStore>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<MoveBody>,
) -> Result<Json<JsonValue>, AppError> {
    let candidate = CandidateMove {
        from: board::parse_square(&body.from)
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        to: board::parse_square(&body.to)
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        promotion: match body.promotion.as_deref() {
            Some(p) => Some(
                board::parse_role(p)
                    .ok_or_else(|| AppError::BadRequest(format!("invalid promotion piece '{p}'")))?,
            ),
            None => None,
        },
    };

    let entry = lookup(&store, &session_id).await?;
    let mut guard = entry.lock().await;
    let outcome = guard.session.attempt(&candidate)?;

    let response = match &outcome {
        AttemptOutcome::Correct {
            san,
            mate_override,
            solved,
            reply,
        } => json!({
            "verdict": "correct",
            "san": san,
            "alternate_mate": mate_override,
            "puzzle_solved": solved,
            "awaiting_reply": reply.is_some(),
        }),
        AttemptOutcome::Incorrect { feedback, hint } => {
            let message = match feedback {
                MissFeedback::AttemptsRemaining(n) => {
                    format!("Not the move — {n} attempts remaining")
                }
                MissFeedback::HintUnlocked => "Here's a hint".to_string(),
                MissFeedback::TryAgain => "Not quite — try again".to_string(),
            };
            json!({
                "verdict": "incorrect",
                "message": message,
                "hint": hint.map(|(from, to)| json!({
                    "from": from.to_string(),
                    "to": to.to_string(),
                })),
            })
        }
    };

    if let AttemptOutcome::Correct {
        reply: Some(key), ..
    } = outcome
    {
        schedule_reply(&entry, key, config.reply_delay_ms);
    }

    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct LegalMovesQuery {
    pub square: String,
}

/// GET /api/sessions/{session_id}/legal-moves?square=e2
/// Oracle legal destinations for the board layer's drag highlighting.
pub async fn legal_moves(
    Extension(store): Extension<SessionStore>,
    Path(session_id): Path<Uuid>,
    Query(q): Query<LegalMovesQuery>,
) -> Result<Json<JsonValue>, AppError> {
    let from = board::parse_square(&q.square)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let entry = lookup(&store, &session_id).await?;
    let guard = entry.lock().await;
    let destinations: Vec<String> = board::legal_destinations(guard.session.position(), from)
        .into_iter()
        .map(|sq| sq.to_string())
        .collect();
    Ok(Json(json!({
        "square": q.square,
        "destinations": destinations,
    })))
}

/// POST /api/sessions/{session_id}/reveal
/// The learner gives up on the current puzzle; it settles as wrong.
pub async fn reveal_solution(
    Extension(store): Extension<SessionStore>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let entry = lookup(&store, &session_id).await?;
    let mut guard = entry.lock().await;
    guard.session.reveal_solution()?;
    Ok(Json(session_view(&guard.session)))
}

/// POST /api/sessions/{session_id}/continue
/// Finalize the settled puzzle and advance. Completion persists the
/// first-attempt score and bumps play counts.
pub async fn continue_session(
    Extension(pool): Extension<PgPool>,
    Extension(store): Extension<SessionStore>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    let entry = lookup(&store, &session_id).await?;
    let mut guard = entry.lock().await;
    let outcome = guard.session.advance()?;

    match outcome {
        ContinueOutcome::Next { puzzle_id } => Ok(Json(json!({
            "next": "puzzle",
            "puzzle_id": puzzle_id,
            "state": session_view(&guard.session),
        }))),
        ContinueOutcome::RetryRound { round, remaining } => Ok(Json(json!({
            "next": "retry_round",
            "retry_round": round,
            "remaining": remaining,
            "state": session_view(&guard.session),
        }))),
        ContinueOutcome::Complete { score } => {
            let lesson_id = guard.lesson_id.clone();
            let puzzle_ids = guard.session.puzzle_ids();
            drop(guard);

            progress::record_completion(&pool, &lesson_id, score.correct as i32, score.total as i32)
                .await?;
            puzzles::increment_plays(&pool, &puzzle_ids).await?;
            tracing::info!(
                session_id = %session_id,
                lesson_id = %lesson_id,
                correct = score.correct,
                total = score.total,
                "lesson completed"
            );

            Ok(Json(json!({
                "next": "complete",
                "lesson_id": lesson_id,
                "score": { "correct": score.correct, "total": score.total },
            })))
        }
    }
}

/// DELETE /api/sessions/{session_id}
/// Exit the lesson. In-flight reply timers become stale no-ops.
pub async fn end_session(
    Extension(store): Extension<SessionStore>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    store
        .remove(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    tracing::info!(session_id = %session_id, "lesson session discarded");
    Ok(Json(json!({ "ok": true })))
}

async fn lookup(
    store: &SessionStore,
    session_id: &Uuid,
) -> Result<Arc<Mutex<ActiveSession>>, AppError> {
    store
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

/// Fire the recorded opponent reply after the configured delay. The task
/// holds only a weak reference and the reply key; if the session was
/// removed or has moved on, delivery is silently discarded.
fn schedule_reply(entry: &Arc<Mutex<ActiveSession>>, key: ReplyKey, delay_ms: u64) {
    let weak = Arc::downgrade(entry);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        let Some(entry) = weak.upgrade() else {
            return;
        };
        let mut guard = entry.lock().await;
        match guard.session.apply_reply(&key) {
            ReplyOutcome::Applied { san, solved } => {
                tracing::debug!(%san, solved, "opponent reply applied");
            }
            ReplyOutcome::PresumedSolved => {
                tracing::warn!(
                    puzzle_id = %key.puzzle_id,
                    "recorded reply was unplayable; puzzle marked solved"
                );
            }
            ReplyOutcome::Stale => {
                tracing::debug!(puzzle_id = %key.puzzle_id, "discarding stale opponent reply");
            }
        }
    });
}

fn session_view(session: &LessonSession) -> JsonValue {
    let puzzle = session.current_puzzle();
    let (pass_index, pass_length) = session.pass_progress();

    let status = match session.move_status() {
        MoveStatus::Playing => "playing",
        MoveStatus::AwaitingReply => "awaiting_reply",
        MoveStatus::SolvedCorrect => "solved_correct",
        MoveStatus::SolvedWrong => "solved_wrong",
    };

    // The full line is only exposed once the learner has given up.
    let solution = (session.move_status() == MoveStatus::SolvedWrong).then(|| {
        puzzle
            .solution
            .iter()
            .map(|step| step.san.clone())
            .collect::<Vec<_>>()
    });

    json!({
        "complete": session.is_complete(),
        "phase": match session.phase() {
            Phase::Primary => "primary",
            Phase::Retry => "retry",
        },
        "retry_round": session.round(),
        "pass_index": pass_index,
        "pass_length": pass_length,
        "puzzle": {
            "id": puzzle.id,
            "fen": session.position_fen(),
            "player_color": board::color_name(puzzle.player_color),
            "setup_from": puzzle.setup_from.to_string(),
            "setup_to": puzzle.setup_to.to_string(),
            "rating": puzzle.rating,
            "themes": puzzle.themes,
        },
        "moves_played": session.moves_played(),
        "status": status,
        "hint": session.hint().map(|(from, to)| json!({
            "from": from.to_string(),
            "to": to.to_string(),
        })),
        "solution": solution,
        "score": session.final_score().map(|s| json!({
            "correct": s.correct,
            "total": s.total,
        })),
    })
}
