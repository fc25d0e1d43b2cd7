//! Solution matching: decides whether a board-layer move attempt matches
//! the expected solution step.

use shakmaty::Chess;

use crate::board::{self, CandidateMove};

#[derive(Debug, Clone)]
pub enum MatchVerdict {
    /// The attempt matches: either the recorded solution move, or (for
    /// mate-family puzzles) any legal move that delivers checkmate.
    Correct {
        position: Chess,
        san: String,
        mate_override: bool,
    },
    /// Illegal, or legal but not the expected move.
    Incorrect,
}

/// Match an attempt against the expected solution step.
///
/// `expected` is the display notation from puzzle preparation; it may also
/// be raw UCI text when the replay fell back, so both notations are
/// compared. Check/mate suffixes are stripped on both sides.
pub fn match_attempt(
    pos: &Chess,
    candidate: &CandidateMove,
    expected: &str,
    accepts_any_mate: bool,
) -> MatchVerdict {
    let Some(mv) = board::resolve_candidate(pos, candidate) else {
        return MatchVerdict::Incorrect;
    };

    let mut after = pos.clone();
    let san = board::san_and_play(&mut after, &mv);
    let want = board::strip_annotations(expected);

    if board::strip_annotations(&san) == want || board::uci_string(&mv) == want {
        return MatchVerdict::Correct {
            position: after,
            san,
            mate_override: false,
        };
    }

    // Mate-family puzzles accept any mating move, not only the recorded one.
    if accepts_any_mate && board::is_checkmate(&after) {
        return MatchVerdict::Correct {
            position: after,
            san,
            mate_override: true,
        };
    }

    MatchVerdict::Incorrect
}
