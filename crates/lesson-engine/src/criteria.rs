//! Lesson batch criteria — the query shape the engine's puzzle source is
//! asked with. The engine never fetches; the hosting layer resolves the
//! criteria against whatever corpus it has.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchCriteria {
    /// Every listed theme must be present.
    #[serde(default)]
    pub themes_all: Vec<String>,
    /// None of the listed themes may be present.
    #[serde(default)]
    pub themes_none: Vec<String>,
    /// Mixed-practice subset: at least one of these themes must be present.
    #[serde(default)]
    pub themes_any: Vec<String>,
    pub rating_min: Option<i32>,
    pub rating_max: Option<i32>,
    /// Minimum historical play count.
    pub min_plays: Option<i64>,
    /// Restrict to puzzles whose first solver move is made by this piece
    /// ("knight", "rook", ...).
    pub piece: Option<String>,
}

impl BatchCriteria {
    pub fn is_unfiltered(&self) -> bool {
        self.themes_all.is_empty()
            && self.themes_none.is_empty()
            && self.themes_any.is_empty()
            && self.rating_min.is_none()
            && self.rating_max.is_none()
            && self.min_plays.is_none()
            && self.piece.is_none()
    }
}
