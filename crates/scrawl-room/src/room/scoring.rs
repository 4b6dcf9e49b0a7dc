//! The scoring intermission between games.

use scrawl_protocol::{ScoreEntry, StateView};
use tokio::time::Instant;

use super::Transition;

/// Final standings of the game that just ended, shown until `end`.
pub(super) struct Scoring {
    standings: Vec<ScoreEntry>,
    end: Instant,
}

impl Scoring {
    pub fn new(standings: Vec<ScoreEntry>, end: Instant) -> Self {
        Self { standings, end }
    }

    pub fn view(&self) -> StateView {
        StateView::Score {
            scores: self.standings.clone(),
        }
    }

    pub fn think(&self, now: Instant) -> Transition {
        if now > self.end {
            Transition::NewGame
        } else {
            Transition::Stay
        }
    }
}
