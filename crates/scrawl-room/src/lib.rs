//! Room game-state engine for Scrawl.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! roster, scores, chat backlog and round state machine.
//!
//! # Key types
//!
//! - [`Room`]: the synchronous state machine: Waiting → Round → Scoring
//! - [`RoomHandle`]: send actions and ticks to a running room actor
//! - [`RoomRegistry`]: creates rooms, routes participants, ticks all
//! - [`RoomParams`]: per-room timing and rule parameters
//! - [`PhraseSource`]: where each round's secret phrase comes from
//! - [`StrokeLog`], [`ChatBacklog`], [`ScoreBoard`], [`create_hint`]:
//!   the pieces a round is built from

mod chat;
mod config;
mod error;
mod handle;
mod hint;
mod manager;
mod phrase;
mod room;
mod roster;
mod score;
mod stroke;

pub use chat::ChatBacklog;
pub use config::{RoomParams, RoundPhase};
pub use error::RoomError;
pub use handle::{RoomHandle, spawn_room};
pub use hint::{HINT_FILLER, create_hint};
pub use manager::{Relocation, RoomRegistry};
pub use phrase::{PhraseChooser, PhraseSource, WordList};
pub use room::{Room, RoomInfo, TOTAL_HINTS};
pub use score::ScoreBoard;
pub use stroke::{Pen, StrokeError, StrokeLog, op};
