//! Per-game score keeping.

use std::collections::HashMap;

use scrawl_protocol::ScoreEntry;

/// Participant name → score. Names never seen score 0. Scores may go
/// negative since hints cost the artists points.
#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    scores: HashMap<String, i64>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> i64 {
        self.scores.get(name).copied().unwrap_or(0)
    }

    pub fn add(&mut self, name: &str, points: i64) {
        *self.scores.entry(name.to_string()).or_insert(0) += points;
    }

    /// Zeroes every score.
    pub fn reset(&mut self) {
        self.scores.clear();
    }

    /// Everyone who has a score, highest first, ties broken by name.
    pub fn ranked(&self) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self
            .scores
            .iter()
            .map(|(name, &score)| ScoreEntry {
                name: name.clone(),
                score,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_names_score_zero() {
        let board = ScoreBoard::new();
        assert_eq!(board.get("nobody"), 0);
    }

    #[test]
    fn test_add_accumulates_and_may_go_negative() {
        let mut board = ScoreBoard::new();
        board.add("ann", -2);
        board.add("ann", -2);
        board.add("bob", 10);
        assert_eq!(board.get("ann"), -4);
        assert_eq!(board.get("bob"), 10);
    }

    #[test]
    fn test_ranked_sorts_by_score_then_name() {
        let mut board = ScoreBoard::new();
        board.add("cat", 5);
        board.add("bob", 9);
        board.add("ann", 5);

        let names: Vec<String> = board.ranked().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["bob", "ann", "cat"]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut board = ScoreBoard::new();
        board.add("ann", 3);
        board.reset();
        assert_eq!(board.get("ann"), 0);
        assert!(board.ranked().is_empty());
    }
}
