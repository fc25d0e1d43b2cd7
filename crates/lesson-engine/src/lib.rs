//! The puzzle lesson session engine.
//!
//! One `LessonSession` owns the full state of a learner's run through a
//! batch of tactical puzzles: per-move matching, the wrong-attempt hint
//! ladder, the primary-then-retry traversal and first-attempt scoring.
//! The engine is synchronous and event-driven — it only moves in response
//! to an explicit operation from its driver.

pub mod criteria;
pub mod events;
pub mod ladder;
pub mod scheduler;
pub mod score;
pub mod session;

pub use criteria::BatchCriteria;
pub use events::{SessionEvent, SessionObserver, TracingObserver};
pub use ladder::{MissFeedback, WrongAttemptLadder, HINT_THRESHOLD};
pub use scheduler::{Phase, RetryScheduler, SchedulerStep};
pub use score::{LessonScore, PuzzleResult, ScoreTracker};
pub use session::{
    AttemptOutcome, ContinueOutcome, LessonSession, MoveStatus, ReplyKey, ReplyOutcome,
    SessionError,
};
