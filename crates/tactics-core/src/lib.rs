pub mod board;
pub mod matcher;
pub mod puzzle;

pub use board::{CandidateMove, CoreError};
pub use matcher::MatchVerdict;
pub use puzzle::{PreparedPuzzle, PrepareError, RawPuzzle, SolutionMove};
