//! The per-lesson session state machine.
//!
//! All operations are driven from the outside: a move attempt from the
//! board layer, the delayed opponent reply, the learner's "give up" and
//! "continue" clicks. Each operation is only valid in the states the
//! guards allow, so no sequence of calls can strand the session.

use shakmaty::{Chess, Square};

use tactics_core::board::{self, CandidateMove};
use tactics_core::matcher::{self, MatchVerdict};
use tactics_core::puzzle::PreparedPuzzle;

use crate::events::{SessionEvent, SessionObserver};
use crate::ladder::{MissFeedback, WrongAttemptLadder};
use crate::scheduler::{Phase, RetryScheduler, SchedulerStep};
use crate::score::{LessonScore, PuzzleResult, ScoreTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// The player's move is expected.
    Playing,
    /// A correct move was played; the recorded opponent reply has been
    /// scheduled and no new attempts are accepted until it lands.
    AwaitingReply,
    SolvedCorrect,
    SolvedWrong,
}

/// Identifies the scheduled opponent reply. A key taken before the session
/// moved on no longer matches and is discarded on delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKey {
    pub puzzle_id: String,
    pub cursor: usize,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Correct {
        san: String,
        mate_override: bool,
        solved: bool,
        /// Present when an opponent reply must be delivered via
        /// [`LessonSession::apply_reply`] after the driver's delay.
        reply: Option<ReplyKey>,
    },
    Incorrect {
        feedback: MissFeedback,
        /// From/to squares of the expected move, on the miss that unlocks
        /// the hint.
        hint: Option<(Square, Square)>,
    },
}

#[derive(Debug, Clone)]
pub enum ReplyOutcome {
    Applied { san: String, solved: bool },
    /// The recorded reply failed to apply (bad data). The player's own
    /// moves were already verified, so the puzzle counts as solved instead
    /// of stalling.
    PresumedSolved,
    /// The key no longer matches the live puzzle/cursor; nothing happened.
    Stale,
}

#[derive(Debug, Clone)]
pub enum ContinueOutcome {
    Next { puzzle_id: String },
    RetryRound { round: u32, remaining: usize },
    Complete { score: LessonScore },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a lesson needs at least one playable puzzle")]
    EmptyBatch,

    #[error("the lesson is already complete")]
    LessonComplete,

    #[error("no move is expected right now")]
    NotAwaitingMove,

    #[error("the current puzzle is not settled yet")]
    NotSettled,

    #[error("the current puzzle is already settled")]
    AlreadySettled,

    #[error("the opponent reply is still pending")]
    ReplyPending,
}

#[derive(Debug)]
struct PlayState {
    position: Chess,
    cursor: usize,
    status: MoveStatus,
    ladder: WrongAttemptLadder,
    missed_this_view: bool,
    moves_played: Vec<String>,
}

impl PlayState {
    fn load(puzzle: &PreparedPuzzle) -> Self {
        Self {
            position: puzzle.play_from.clone(),
            cursor: 0,
            status: MoveStatus::Playing,
            ladder: WrongAttemptLadder::new(),
            missed_this_view: false,
            moves_played: Vec::new(),
        }
    }
}

pub struct LessonSession {
    puzzles: Vec<PreparedPuzzle>,
    scheduler: RetryScheduler,
    score: ScoreTracker,
    play: PlayState,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl LessonSession {
    pub fn new(puzzles: Vec<PreparedPuzzle>) -> Result<Self, SessionError> {
        if puzzles.is_empty() {
            return Err(SessionError::EmptyBatch);
        }
        let play = PlayState::load(&puzzles[0]);
        let total = puzzles.len();
        Ok(Self {
            puzzles,
            scheduler: RetryScheduler::new(total),
            score: ScoreTracker::new(total),
            play,
            observers: Vec::new(),
        })
    }

    pub fn observe(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer.handle(&event);
        }
    }

    pub fn current_puzzle(&self) -> &PreparedPuzzle {
        &self.puzzles[self.scheduler.current()]
    }

    pub fn total_puzzles(&self) -> usize {
        self.puzzles.len()
    }

    /// Ids of the primary batch, in lesson order.
    pub fn puzzle_ids(&self) -> Vec<String> {
        self.puzzles.iter().map(|p| p.id.clone()).collect()
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn round(&self) -> u32 {
        self.scheduler.round()
    }

    pub fn pass_progress(&self) -> (usize, usize) {
        self.scheduler.pass_progress()
    }

    pub fn is_complete(&self) -> bool {
        self.scheduler.is_complete()
    }

    pub fn move_status(&self) -> MoveStatus {
        self.play.status
    }

    pub fn solution_cursor(&self) -> usize {
        self.play.cursor
    }

    pub fn position(&self) -> &Chess {
        &self.play.position
    }

    pub fn position_fen(&self) -> String {
        board::fen_string(&self.play.position)
    }

    /// Display notation of the moves applied to the board so far in the
    /// current puzzle.
    pub fn moves_played(&self) -> &[String] {
        &self.play.moves_played
    }

    /// The hint overlay squares, once the ladder has revealed them.
    pub fn hint(&self) -> Option<(Square, Square)> {
        if self.play.ladder.hint_shown() {
            self.current_puzzle().hint_squares(self.play.cursor)
        } else {
            None
        }
    }

    pub fn score_tracker(&self) -> &ScoreTracker {
        &self.score
    }

    pub fn final_score(&self) -> Option<LessonScore> {
        self.scheduler
            .is_complete()
            .then(|| self.score.final_score())
    }

    /// A move attempt from the board layer. Only valid while the player's
    /// move is expected; anything else is rejected without side effects.
    pub fn attempt(&mut self, candidate: &CandidateMove) -> Result<AttemptOutcome, SessionError> {
        if self.scheduler.is_complete() {
            return Err(SessionError::LessonComplete);
        }
        if self.play.status != MoveStatus::Playing {
            return Err(SessionError::NotAwaitingMove);
        }
        debug_assert!(self.play.cursor % 2 == 0, "player moves sit at even indices");

        let puzzle = self.current_puzzle();
        let cursor = self.play.cursor;
        let puzzle_id = puzzle.id.clone();
        let solution_len = puzzle.solution_len();
        let accepts_any_mate = puzzle.accepts_any_mate;
        let expected = match puzzle.expected(cursor) {
            Some(step) => step.san.clone(),
            None => return Err(SessionError::AlreadySettled),
        };
        let hint_squares = puzzle.hint_squares(cursor);

        match matcher::match_attempt(&self.play.position, candidate, &expected, accepts_any_mate) {
            MatchVerdict::Incorrect => {
                self.play.missed_this_view = true;
                let feedback = self.play.ladder.record_miss();
                let hint = if feedback == MissFeedback::HintUnlocked {
                    self.emit(SessionEvent::HintRevealed { puzzle_id });
                    hint_squares
                } else {
                    None
                };
                Ok(AttemptOutcome::Incorrect { feedback, hint })
            }
            MatchVerdict::Correct {
                position,
                san,
                mate_override,
            } => {
                self.play.position = position;
                self.play.moves_played.push(san.clone());
                self.play.cursor += 1;
                self.play.ladder.reset();
                if self.play.cursor == solution_len {
                    self.play.status = MoveStatus::SolvedCorrect;
                    Ok(AttemptOutcome::Correct {
                        san,
                        mate_override,
                        solved: true,
                        reply: None,
                    })
                } else {
                    self.play.status = MoveStatus::AwaitingReply;
                    Ok(AttemptOutcome::Correct {
                        san,
                        mate_override,
                        solved: false,
                        reply: Some(ReplyKey {
                            puzzle_id,
                            cursor: self.play.cursor,
                        }),
                    })
                }
            }
        }
    }

    /// Deliver the scheduled opponent reply. Stale keys — the session moved
    /// to another puzzle, the learner gave up, the session was completed —
    /// are discarded silently.
    pub fn apply_reply(&mut self, key: &ReplyKey) -> ReplyOutcome {
        if self.scheduler.is_complete() || self.play.status != MoveStatus::AwaitingReply {
            return ReplyOutcome::Stale;
        }
        let puzzle = self.current_puzzle();
        if puzzle.id != key.puzzle_id || self.play.cursor != key.cursor {
            return ReplyOutcome::Stale;
        }

        let solution_len = puzzle.solution_len();
        let step_uci = puzzle.expected(self.play.cursor).map(|s| s.uci.clone());
        let Some(step_uci) = step_uci else {
            self.play.status = MoveStatus::SolvedCorrect;
            return ReplyOutcome::PresumedSolved;
        };

        match board::apply_uci(&self.play.position, &step_uci) {
            Ok((next, _, san)) => {
                self.play.position = next;
                self.play.moves_played.push(san.clone());
                self.play.cursor += 1;
                self.play.ladder.reset();
                if self.play.cursor == solution_len {
                    self.play.status = MoveStatus::SolvedCorrect;
                    ReplyOutcome::Applied { san, solved: true }
                } else {
                    self.play.status = MoveStatus::Playing;
                    ReplyOutcome::Applied { san, solved: false }
                }
            }
            Err(err) => {
                // Bad recorded reply; the player already proved the line.
                tracing::warn!(
                    puzzle_id = %key.puzzle_id,
                    cursor = key.cursor,
                    %err,
                    "opponent reply failed to apply, treating puzzle as solved"
                );
                self.play.status = MoveStatus::SolvedCorrect;
                ReplyOutcome::PresumedSolved
            }
        }
    }

    /// The learner gives up on the current puzzle; it settles as wrong and
    /// the solution may be shown.
    pub fn reveal_solution(&mut self) -> Result<(), SessionError> {
        if self.scheduler.is_complete() {
            return Err(SessionError::LessonComplete);
        }
        match self.play.status {
            MoveStatus::Playing => {
                self.play.missed_this_view = true;
                self.play.status = MoveStatus::SolvedWrong;
                Ok(())
            }
            MoveStatus::AwaitingReply => Err(SessionError::ReplyPending),
            MoveStatus::SolvedCorrect | MoveStatus::SolvedWrong => {
                Err(SessionError::AlreadySettled)
            }
        }
    }

    /// The "continue" click: finalize the settled puzzle's result and move
    /// on. A puzzle solved only after wrong attempts still finalizes as
    /// `Wrong` for scoring, even though the board shows it completed.
    pub fn advance(&mut self) -> Result<ContinueOutcome, SessionError> {
        if self.scheduler.is_complete() {
            return Err(SessionError::LessonComplete);
        }
        let result = match self.play.status {
            MoveStatus::SolvedCorrect if !self.play.missed_this_view => PuzzleResult::Correct,
            MoveStatus::SolvedCorrect | MoveStatus::SolvedWrong => PuzzleResult::Wrong,
            MoveStatus::Playing | MoveStatus::AwaitingReply => {
                return Err(SessionError::NotSettled)
            }
        };

        let phase = self.scheduler.phase();
        let puzzle_id = self.current_puzzle().id.clone();
        self.score.record(&puzzle_id, result, phase);
        self.scheduler.note_result(result == PuzzleResult::Wrong);

        let first_attempt_correct =
            self.score.first_attempt_result(&puzzle_id) == Some(PuzzleResult::Correct);
        self.emit(SessionEvent::PuzzleCompleted {
            puzzle_id,
            first_attempt_correct,
        });

        match self.scheduler.advance() {
            SchedulerStep::Next(index) => {
                self.play = PlayState::load(&self.puzzles[index]);
                Ok(ContinueOutcome::Next {
                    puzzle_id: self.puzzles[index].id.clone(),
                })
            }
            SchedulerStep::RetryRound {
                round,
                first,
                remaining,
            } => {
                self.play = PlayState::load(&self.puzzles[first]);
                Ok(ContinueOutcome::RetryRound { round, remaining })
            }
            SchedulerStep::Complete => {
                let score = self.score.final_score();
                self.emit(SessionEvent::SessionComplete { score });
                Ok(ContinueOutcome::Complete { score })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::RecordingObserver;
    use tactics_core::puzzle::{self, RawPuzzle};

    /// Scholar's mate: one solver move (Qxf7#).
    fn one_move_puzzle(id: &str) -> PreparedPuzzle {
        puzzle::prepare(&RawPuzzle {
            id: id.to_string(),
            fen: "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 3 3".to_string(),
            moves: vec!["g8f6".to_string(), "h5f7".to_string()],
            rating: 900,
            themes: vec!["mate".to_string(), "mateIn1".to_string()],
            plays: 10,
        })
        .unwrap()
    }

    /// Two-rook ladder: solver move, recorded reply, solver mate.
    fn three_move_puzzle(id: &str) -> PreparedPuzzle {
        puzzle::prepare(&RawPuzzle {
            id: id.to_string(),
            fen: "7k/8/R7/1R6/8/8/8/6K1 b - - 0 1".to_string(),
            moves: vec![
                "h8h7".to_string(),
                "b5b7".to_string(),
                "h7h8".to_string(),
                "a6a8".to_string(),
            ],
            rating: 1200,
            themes: vec!["mateIn2".to_string(), "endgame".to_string()],
            plays: 10,
        })
        .unwrap()
    }

    fn cand(from: &str, to: &str) -> CandidateMove {
        CandidateMove {
            from: from.parse().unwrap(),
            to: to.parse().unwrap(),
            promotion: None,
        }
    }

    #[test]
    fn test_single_puzzle_solved_first_try() {
        let mut session = LessonSession::new(vec![one_move_puzzle("p1")]).unwrap();
        let outcome = session.attempt(&cand("h5", "f7")).unwrap();
        assert!(matches!(
            outcome,
            AttemptOutcome::Correct {
                solved: true,
                reply: None,
                ..
            }
        ));
        assert_eq!(session.move_status(), MoveStatus::SolvedCorrect);

        let outcome = session.advance().unwrap();
        match outcome {
            ContinueOutcome::Complete { score } => {
                assert_eq!(score, LessonScore { correct: 1, total: 1 });
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(session.is_complete());
    }

    #[test]
    fn test_reply_cycle_and_second_player_move() {
        let mut session = LessonSession::new(vec![three_move_puzzle("p1")]).unwrap();

        let outcome = session.attempt(&cand("b5", "b7")).unwrap();
        let key = match outcome {
            AttemptOutcome::Correct {
                solved: false,
                reply: Some(key),
                ..
            } => key,
            other => panic!("expected pending reply, got {other:?}"),
        };
        assert_eq!(session.move_status(), MoveStatus::AwaitingReply);
        // No attempts while the reply is in flight.
        assert_eq!(
            session.attempt(&cand("a6", "a8")).unwrap_err(),
            SessionError::NotAwaitingMove
        );

        match session.apply_reply(&key) {
            ReplyOutcome::Applied { san, solved } => {
                assert_eq!(san, "Kh8");
                assert!(!solved);
            }
            other => panic!("expected applied reply, got {other:?}"),
        }
        assert_eq!(session.move_status(), MoveStatus::Playing);

        let outcome = session.attempt(&cand("a6", "a8")).unwrap();
        assert!(matches!(
            outcome,
            AttemptOutcome::Correct { solved: true, .. }
        ));
        // A stale redelivery after the puzzle settled is a no-op.
        assert!(matches!(session.apply_reply(&key), ReplyOutcome::Stale));
    }

    #[test]
    fn test_wrong_attempts_escalate_to_hint() {
        let mut session = LessonSession::new(vec![three_move_puzzle("p1")]).unwrap();
        let wrong = cand("b5", "b6");

        for remaining in [2u8, 1] {
            match session.attempt(&wrong).unwrap() {
                AttemptOutcome::Incorrect { feedback, hint } => {
                    assert_eq!(feedback, MissFeedback::AttemptsRemaining(remaining));
                    assert!(hint.is_none());
                }
                other => panic!("expected a miss, got {other:?}"),
            }
        }
        assert!(session.hint().is_none());

        match session.attempt(&wrong).unwrap() {
            AttemptOutcome::Incorrect { feedback, hint } => {
                assert_eq!(feedback, MissFeedback::HintUnlocked);
                assert_eq!(hint, Some(("b5".parse().unwrap(), "b7".parse().unwrap())));
            }
            other => panic!("expected the hint, got {other:?}"),
        }
        assert!(session.hint().is_some());

        // Further misses stay generic; the puzzle remains playable.
        match session.attempt(&wrong).unwrap() {
            AttemptOutcome::Incorrect { feedback, hint } => {
                assert_eq!(feedback, MissFeedback::TryAgain);
                assert!(hint.is_none());
            }
            other => panic!("expected a generic miss, got {other:?}"),
        }
        assert_eq!(session.move_status(), MoveStatus::Playing);

        // Solving after misses still works, but finalizes as wrong.
        session.attempt(&cand("b5", "b7")).unwrap();
        let key = ReplyKey {
            puzzle_id: "p1".to_string(),
            cursor: 1,
        };
        session.apply_reply(&key);
        session.attempt(&cand("a6", "a8")).unwrap();
        assert_eq!(session.move_status(), MoveStatus::SolvedCorrect);

        match session.advance().unwrap() {
            ContinueOutcome::RetryRound { round, remaining } => {
                assert_eq!(round, 1);
                assert_eq!(remaining, 1);
            }
            other => panic!("expected a retry round, got {other:?}"),
        }
        assert_eq!(
            session.score_tracker().first_attempt_result("p1"),
            Some(PuzzleResult::Wrong)
        );
    }

    #[test]
    fn test_reveal_solution_settles_wrong() {
        let mut session =
            LessonSession::new(vec![one_move_puzzle("p1"), one_move_puzzle("p2")]).unwrap();
        session.reveal_solution().unwrap();
        assert_eq!(session.move_status(), MoveStatus::SolvedWrong);
        assert_eq!(
            session.reveal_solution().unwrap_err(),
            SessionError::AlreadySettled
        );

        match session.advance().unwrap() {
            ContinueOutcome::Next { puzzle_id } => assert_eq!(puzzle_id, "p2"),
            other => panic!("expected the next puzzle, got {other:?}"),
        }
        assert_eq!(
            session.score_tracker().latest_result("p1"),
            Some(PuzzleResult::Wrong)
        );
    }

    #[test]
    fn test_continue_requires_settled_puzzle() {
        let mut session = LessonSession::new(vec![one_move_puzzle("p1")]).unwrap();
        assert_eq!(session.advance().unwrap_err(), SessionError::NotSettled);
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(matches!(
            LessonSession::new(Vec::new()),
            Err(SessionError::EmptyBatch)
        ));
    }

    #[test]
    fn test_bad_recorded_reply_presumes_solved() {
        let mut prepared = three_move_puzzle("p1");
        // Corrupt the recorded reply after preparation.
        prepared.solution[1].uci = "h7h1".to_string();
        let mut session = LessonSession::new(vec![prepared]).unwrap();

        let key = match session.attempt(&cand("b5", "b7")).unwrap() {
            AttemptOutcome::Correct { reply: Some(key), .. } => key,
            other => panic!("expected pending reply, got {other:?}"),
        };
        assert!(matches!(
            session.apply_reply(&key),
            ReplyOutcome::PresumedSolved
        ));
        assert_eq!(session.move_status(), MoveStatus::SolvedCorrect);

        // First-attempt clean solve: counts as correct.
        match session.advance().unwrap() {
            ContinueOutcome::Complete { score } => {
                assert_eq!(score, LessonScore { correct: 1, total: 1 });
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[test]
    fn test_events_reach_observers() {
        let observer = RecordingObserver::default();
        let sink = observer.sink();
        let mut session = LessonSession::new(vec![one_move_puzzle("p1")]).unwrap();
        session.observe(Box::new(observer));

        session.attempt(&cand("h5", "f7")).unwrap();
        session.advance().unwrap();

        let events = sink.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                SessionEvent::PuzzleCompleted {
                    puzzle_id: "p1".to_string(),
                    first_attempt_correct: true,
                },
                SessionEvent::SessionComplete {
                    score: LessonScore { correct: 1, total: 1 },
                },
            ]
        );
    }
}
