//! Puzzle data model and preparation.
//!
//! A raw puzzle records the position *before* the opponent's setup move and
//! a flat UCI move list whose first element is that setup move. Preparation
//! applies the setup move, derives the solver's color and converts the
//! remaining line to display notation.

use serde::{Deserialize, Serialize};
use shakmaty::{Chess, Color, Position, Role, Square};

use crate::board::{self, CoreError};

/// A puzzle as stored in the corpus and served to lessons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPuzzle {
    pub id: String,
    pub fen: String,
    pub moves: Vec<String>,
    pub rating: i32,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub plays: i64,
}

/// One step of a prepared solution line. `san` falls back to the raw UCI
/// text when the replay could not produce display notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionMove {
    pub uci: String,
    pub san: String,
}

/// A playable puzzle: setup move applied, solution in display notation.
/// Even solution indices are the solver's moves, odd indices the opponent's
/// recorded replies.
#[derive(Debug, Clone)]
pub struct PreparedPuzzle {
    pub id: String,
    pub play_from: Chess,
    pub play_from_fen: String,
    pub player_color: Color,
    pub solution: Vec<SolutionMove>,
    pub setup_from: Square,
    pub setup_to: Square,
    pub rating: i32,
    pub themes: Vec<String>,
    pub accepts_any_mate: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("puzzle has an empty move list")]
    EmptyMoveList,

    #[error("puzzle has a setup move but no solution")]
    NoSolution,

    #[error("puzzle cannot be set up: {0}")]
    Setup(#[from] CoreError),
}

/// Mate-family tag check: any theme containing "mate", case-insensitive
/// ("mate", "mateIn2", "smotheredMate", ...).
pub fn has_mate_theme(themes: &[String]) -> bool {
    themes
        .iter()
        .any(|t| t.to_ascii_lowercase().contains("mate"))
}

/// Build a playable puzzle from a raw record.
///
/// A setup move the oracle rejects fails the whole puzzle. A failed replay
/// step inside the solution degrades to the raw UCI text for that index and
/// the rest of the line — the solution list never shortens, so cursor
/// arithmetic stays valid.
pub fn prepare(raw: &RawPuzzle) -> Result<PreparedPuzzle, PrepareError> {
    let (setup, rest) = raw.moves.split_first().ok_or(PrepareError::EmptyMoveList)?;
    if rest.is_empty() {
        return Err(PrepareError::NoSolution);
    }

    let start = board::position_from_fen(&raw.fen)?;
    let (play_from, setup_mv, _) = board::apply_uci(&start, setup)?;
    let (setup_from, setup_to) = board::move_squares(&setup_mv);
    let player_color = play_from.turn();

    let mut solution = Vec::with_capacity(rest.len());
    let mut replay = Some(play_from.clone());
    for uci in rest {
        let applied = replay.as_ref().and_then(|pos| board::apply_uci(pos, uci).ok());
        match applied {
            Some((next, _, san)) => {
                solution.push(SolutionMove {
                    uci: uci.clone(),
                    san,
                });
                replay = Some(next);
            }
            None => {
                // Position can no longer advance; keep raw text from here on.
                solution.push(SolutionMove {
                    uci: uci.clone(),
                    san: uci.clone(),
                });
                replay = None;
            }
        }
    }

    Ok(PreparedPuzzle {
        id: raw.id.clone(),
        play_from_fen: board::fen_string(&play_from),
        play_from,
        player_color,
        solution,
        setup_from,
        setup_to,
        rating: raw.rating,
        themes: raw.themes.clone(),
        accepts_any_mate: has_mate_theme(&raw.themes),
    })
}

impl PreparedPuzzle {
    pub fn solution_len(&self) -> usize {
        self.solution.len()
    }

    pub fn expected(&self, cursor: usize) -> Option<&SolutionMove> {
        self.solution.get(cursor)
    }

    /// From/to squares of the expected move at `cursor`, for the hint
    /// overlay. The UCI text is enough even for fallback steps.
    pub fn hint_squares(&self, cursor: usize) -> Option<(Square, Square)> {
        let uci = &self.solution.get(cursor)?.uci;
        if uci.len() < 4 {
            return None;
        }
        let from = board::parse_square(&uci[0..2]).ok()?;
        let to = board::parse_square(&uci[2..4]).ok()?;
        Some((from, to))
    }

    /// Which piece makes the first solver move. Classified once at ingest
    /// for the lesson criteria's piece filter.
    pub fn solver_piece(&self) -> Option<Role> {
        let first = self.solution.first()?;
        let (_, mv, _) = board::apply_uci(&self.play_from, &first.uci).ok()?;
        Some(mv.role())
    }
}
