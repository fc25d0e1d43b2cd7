//! Session events exposed to the outside world. Persistence, analytics and
//! time tracking attach here as observers; the engine itself never carries
//! those responsibilities.

use crate::score::LessonScore;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A puzzle was finalized by "continue". `first_attempt_correct` is the
    /// write-once primary-pass result for that puzzle.
    PuzzleCompleted {
        puzzle_id: String,
        first_attempt_correct: bool,
    },
    /// The wrong-attempt ladder revealed the hint for the current move.
    HintRevealed { puzzle_id: String },
    /// The last pass ended clean; the score is final.
    SessionComplete { score: LessonScore },
}

pub trait SessionObserver: Send {
    fn handle(&mut self, event: &SessionEvent);
}

/// Default observer: structured logs for every session event.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn handle(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::PuzzleCompleted {
                puzzle_id,
                first_attempt_correct,
            } => {
                tracing::debug!(
                    puzzle_id = %puzzle_id,
                    first_attempt_correct = *first_attempt_correct,
                    "puzzle completed"
                );
            }
            SessionEvent::HintRevealed { puzzle_id } => {
                tracing::debug!(puzzle_id = %puzzle_id, "hint revealed");
            }
            SessionEvent::SessionComplete { score } => {
                tracing::info!(correct = score.correct, total = score.total, "lesson complete");
            }
        }
    }
}
