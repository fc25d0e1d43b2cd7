//! Thin wrapper around shakmaty — the single rules oracle for the rest of
//! the workspace. Everything that touches legality, notation or board state
//! goes through here.

use shakmaty::{
    fen::Fen, san::SanPlus, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, File, Move,
    Position, Role, Square,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid FEN '{0}'")]
    InvalidFen(String),

    #[error("invalid move text '{0}'")]
    InvalidMoveText(String),

    #[error("illegal move '{0}'")]
    IllegalMove(String),

    #[error("invalid square '{0}'")]
    InvalidSquare(String),
}

/// A move attempt as it arrives from the board layer: two squares and an
/// optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

pub fn position_from_fen(fen: &str) -> Result<Chess, CoreError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|_| CoreError::InvalidFen(fen.to_string()))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|_| CoreError::InvalidFen(fen.to_string()))
}

pub fn fen_string(pos: &Chess) -> String {
    Fen::from_position(&pos.clone(), EnPassantMode::Legal).to_string()
}

/// Apply a UCI move to a copy of the position. Returns the new position, the
/// resolved move and its SAN display notation (with check/mate suffix).
pub fn apply_uci(pos: &Chess, uci: &str) -> Result<(Chess, Move, String), CoreError> {
    let parsed: UciMove = uci
        .parse()
        .map_err(|_| CoreError::InvalidMoveText(uci.to_string()))?;
    let mv = parsed
        .to_move(pos)
        .map_err(|_| CoreError::IllegalMove(uci.to_string()))?;
    let mut next = pos.clone();
    let san = SanPlus::from_move_and_play_unchecked(&mut next, mv).to_string();
    Ok((next, mv, san))
}

/// Resolve a board-layer candidate against the position's legal moves.
/// Returns None when the candidate is not legal.
pub fn resolve_candidate(pos: &Chess, candidate: &CandidateMove) -> Option<Move> {
    UciMove::Normal {
        from: candidate.from,
        to: candidate.to,
        promotion: candidate.promotion,
    }
    .to_move(pos)
    .ok()
}

/// SAN for a move, advancing the position past it.
pub fn san_and_play(pos: &mut Chess, mv: &Move) -> String {
    SanPlus::from_move_and_play_unchecked(pos, *mv).to_string()
}

pub fn uci_string(mv: &Move) -> String {
    UciMove::from_move(*mv, CastlingMode::Standard).to_string()
}

/// From/to squares of a move for highlighting. Castling reports the king's
/// travel (e1 -> g1/c1), matching what the board layer draws.
pub fn move_squares(mv: &Move) -> (Square, Square) {
    match mv {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            (*king, Square::from_coords(file, king.rank()))
        }
        _ => (mv.from().unwrap_or_else(|| mv.to()), mv.to()),
    }
}

/// Legal destination squares from a given square, for the board layer's
/// drag highlighting.
pub fn legal_destinations(pos: &Chess, from: Square) -> Vec<Square> {
    pos.legal_moves()
        .iter()
        .filter(|m| m.from() == Some(from))
        .map(|m| move_squares(m).1)
        .collect()
}

pub fn is_checkmate(pos: &Chess) -> bool {
    pos.is_checkmate()
}

/// Strip trailing check/mate marks and annotation glyphs from a SAN string,
/// so "Qh5#" and "Qh5" compare equal.
pub fn strip_annotations(san: &str) -> &str {
    san.trim_end_matches(['+', '#', '!', '?'])
}

pub fn parse_square(s: &str) -> Result<Square, CoreError> {
    s.parse()
        .map_err(|_| CoreError::InvalidSquare(s.to_string()))
}

pub fn parse_role(s: &str) -> Option<Role> {
    let c = s.chars().next()?;
    Role::from_char(c.to_ascii_lowercase())
}

pub fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "pawn",
        Role::Knight => "knight",
        Role::Bishop => "bishop",
        Role::Rook => "rook",
        Role::Queen => "queen",
        Role::King => "king",
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
