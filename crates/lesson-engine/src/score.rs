//! Result bookkeeping: latest result per puzzle plus the write-once
//! first-attempt map that the final grade is computed from.

use std::collections::HashMap;

use serde::Serialize;

use crate::scheduler::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PuzzleResult {
    Correct,
    Wrong,
}

/// The lesson grade: correct first attempts out of the primary batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LessonScore {
    pub correct: usize,
    pub total: usize,
}

impl LessonScore {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoreTracker {
    latest: HashMap<String, PuzzleResult>,
    first_attempt: HashMap<String, PuzzleResult>,
    total_primary: usize,
}

impl ScoreTracker {
    pub fn new(total_primary: usize) -> Self {
        Self {
            latest: HashMap::new(),
            first_attempt: HashMap::new(),
            total_primary,
        }
    }

    /// Record a finalized result. The latest map is overwritten on every
    /// attempt; the first-attempt map is written at most once per puzzle
    /// and only during the primary pass.
    pub fn record(&mut self, puzzle_id: &str, result: PuzzleResult, phase: Phase) {
        self.latest.insert(puzzle_id.to_string(), result);
        if phase == Phase::Primary {
            self.first_attempt
                .entry(puzzle_id.to_string())
                .or_insert(result);
        }
    }

    pub fn latest_result(&self, puzzle_id: &str) -> Option<PuzzleResult> {
        self.latest.get(puzzle_id).copied()
    }

    pub fn first_attempt_result(&self, puzzle_id: &str) -> Option<PuzzleResult> {
        self.first_attempt.get(puzzle_id).copied()
    }

    pub fn final_score(&self) -> LessonScore {
        LessonScore {
            correct: self
                .first_attempt
                .values()
                .filter(|r| **r == PuzzleResult::Correct)
                .count(),
            total: self.total_primary,
        }
    }
}
