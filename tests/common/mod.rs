//! Shared fixtures: small real-board puzzles driven through the engine.

use lesson_engine::LessonSession;
use tactics_core::puzzle::{self, PreparedPuzzle, RawPuzzle};
use tactics_core::CandidateMove;

/// Scholar's mate: Black blunders Nf6, the solver mates with Qxf7#.
/// One solver move.
pub fn scholars_mate(id: &str) -> PreparedPuzzle {
    puzzle::prepare(&RawPuzzle {
        id: id.to_string(),
        fen: "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 3 3".to_string(),
        moves: vec!["g8f6".to_string(), "h5f7".to_string()],
        rating: 900,
        themes: vec!["mate".to_string(), "mateIn1".to_string()],
        plays: 50,
    })
    .unwrap()
}

/// Back rank with two white rooks on d1/e1: after Black's ...Ra2 both
/// Re8# (recorded) and Rd8# deliver mate.
pub fn double_mate_back_rank(id: &str) -> PreparedPuzzle {
    back_rank_with_themes(id, &["mate", "backRankMate"])
}

/// Same board, arbitrary theme tags — lets tests exercise the mate-family
/// gate on the alternate-mate override.
pub fn back_rank_with_themes(id: &str, themes: &[&str]) -> PreparedPuzzle {
    puzzle::prepare(&RawPuzzle {
        id: id.to_string(),
        fen: "r5k1/5ppp/8/8/8/8/6PP/3RR1K1 b - - 0 1".to_string(),
        moves: vec!["a8a2".to_string(), "e1e8".to_string()],
        rating: 1100,
        themes: themes.iter().map(|t| t.to_string()).collect(),
        plays: 50,
    })
    .unwrap()
}

/// Two-rook ladder mate: solver move, recorded king reply, solver mate.
/// Three solution moves, so the opponent auto-reply cycle is exercised.
pub fn ladder_mate(id: &str) -> PreparedPuzzle {
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
        themes: vec!["mateIn2".to_string()],
        plays: 50,
    })
    .unwrap()
}

pub fn cand(from: &str, to: &str) -> CandidateMove {
    CandidateMove {
        from: from.parse().unwrap(),
        to: to.parse().unwrap(),
        promotion: None,
    }
}

/// Play the recorded solution of a scholar's-mate fixture in one attempt.
pub fn solve_scholars(session: &mut LessonSession) {
    session.attempt(&cand("h5", "f7")).unwrap();
}
