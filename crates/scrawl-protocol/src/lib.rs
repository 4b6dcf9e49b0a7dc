//! Wire vocabulary for Scrawl.
//!
//! This crate defines what participants and the server say to each other:
//!
//! - **Types** ([`ClientAction`], [`ServerEvent`] and their payloads):
//!   the values the room engine consumes and produces.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values are
//!   turned into frames and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! ```text
//! Transport (frames) → Protocol (ClientAction / ServerEvent) → Rooms
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Alert, ChatEntry, ChatKind, ClientAction, ParticipantId, ParticipantView, RoundView,
    ScoreEntry, ServerEvent, StateUpdate, StateView, StrokeData,
};
