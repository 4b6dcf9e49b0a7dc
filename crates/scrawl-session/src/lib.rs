//! Participant bookkeeping for Scrawl.
//!
//! This crate is the process-wide connection table:
//!
//! 1. **Login**: binding a connection to a unique display name
//!    ([`ParticipantRegistry::login`])
//! 2. **Location**: which room each participant is in (at most one)
//! 3. **Delivery**: the outbound [`EventSender`] for each participant
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)     ← receives participants with their senders
//!     ↕
//! Session layer (this)   ← names, rooms, presence, outbound channels
//!     ↕
//! Protocol layer (below) ← ParticipantId, ServerEvent
//! ```

mod error;
mod manager;
mod participant;

pub use error::SessionError;
pub use manager::ParticipantRegistry;
pub use participant::{EventSender, MAX_NAME_LEN, MIN_NAME_LEN, Participant, is_valid_name};
