//! Room parameters and the coarse phase a room is in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::RoomError;

// ---------------------------------------------------------------------------
// RoomParams
// ---------------------------------------------------------------------------

/// Timing and rule parameters for a room, fixed at creation.
///
/// In configuration files durations are written as (fractional) seconds
/// under `*_secs` keys; any key left out takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomParams {
    /// Rounds per game before the scoring intermission.
    pub round_limit: u32,

    /// Length of a round before anyone has guessed.
    #[serde(rename = "round_time_secs", with = "secs")]
    pub round_time: Duration,

    /// Time left on the clock once the rush phase starts.
    #[serde(rename = "rush_phase_time_secs", with = "secs")]
    pub rush_phase_time: Duration,

    /// Length of the scoring intermission between games.
    #[serde(rename = "score_time_secs", with = "secs")]
    pub score_time: Duration,

    /// How many participants draw each round.
    pub artist_count: usize,

    /// Roster size needed to start a round. Must be at least 2.
    pub min_player_count: usize,

    /// Grace period after the round clock runs out during which correct
    /// guesses still count.
    #[serde(rename = "time_fudge_secs", with = "secs")]
    pub time_fudge: Duration,

    /// A round with no strokes at all is abandoned after this long and
    /// its artists are marked away.
    #[serde(rename = "draw_inactivity_time_secs", with = "secs")]
    pub draw_inactivity_time: Duration,
}

impl Default for RoomParams {
    fn default() -> Self {
        Self {
            round_limit: 20,
            round_time: Duration::from_secs(150),
            rush_phase_time: Duration::from_secs(20),
            score_time: Duration::from_secs(10),
            artist_count: 1,
            min_player_count: 2,
            time_fudge: Duration::ZERO,
            draw_inactivity_time: Duration::from_secs(30),
        }
    }
}

impl RoomParams {
    /// Checks the invariants artist selection relies on.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidParams`] if `min_player_count < 2`,
    /// `artist_count == 0` or `round_limit == 0`.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.min_player_count < 2 {
            return Err(RoomError::InvalidParams(format!(
                "min_player_count must be at least 2, got {}",
                self.min_player_count
            )));
        }
        if self.artist_count == 0 {
            return Err(RoomError::InvalidParams(
                "artist_count must be at least 1".into(),
            ));
        }
        if self.round_limit == 0 {
            return Err(RoomError::InvalidParams(
                "round_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// RoundPhase
// ---------------------------------------------------------------------------

/// Which state a room's machine is in.
///
/// ```text
/// Waiting → Round → Round → … → Scoring → Round → …
///    ↑        │
///    └────────┘  (not enough active players)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Waiting,
    Round,
    Scoring,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Round => write!(f, "round"),
            Self::Scoring => write!(f, "scoring"),
        }
    }
}
