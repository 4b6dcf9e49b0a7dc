//! The participant registry: every logged-in connection in the process.
//!
//! This is the "connection table". It's responsible for:
//! - Logging participants in under a unique display name
//! - Remembering which room each participant is in
//! - Forgetting participants when their connection goes away
//!
//! # Concurrency note
//!
//! `ParticipantRegistry` is NOT thread-safe by itself: it uses a plain
//! `HashMap`. The server owns exactly one and guards it with a mutex, so
//! name checks and inserts happen under the same lock.

use std::collections::HashMap;

use scrawl_protocol::ParticipantId;

use crate::participant::is_valid_name;
use crate::{EventSender, Participant, SessionError};

/// Registry of logged-in participants, keyed by connection.
///
/// ```text
/// login() ──→ [in no room] ──set_room()──→ [in room] ──quit()──→ gone
/// ```
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<ParticipantId, Participant>,
}

impl ParticipantRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a participant in under `name`.
    ///
    /// # Errors
    /// - [`SessionError::InvalidName`]: `name` breaks the naming rules
    /// - [`SessionError::AlreadyLoggedIn`]: this connection has a name
    /// - [`SessionError::NameInUse`]: another participant has this name,
    ///   ignoring case
    pub fn login(
        &mut self,
        id: ParticipantId,
        name: &str,
        sender: EventSender,
    ) -> Result<&Participant, SessionError> {
        if !is_valid_name(name) {
            return Err(SessionError::InvalidName(name.to_string()));
        }
        if self.participants.contains_key(&id) {
            return Err(SessionError::AlreadyLoggedIn(id));
        }
        if self.find_by_name(name).is_some() {
            return Err(SessionError::NameInUse(name.to_string()));
        }

        tracing::info!(participant = %id, name, "participant logged in");

        let participant = self
            .participants
            .entry(id)
            .or_insert_with(|| Participant::new(id, name.to_string(), sender));
        Ok(participant)
    }

    /// Forgets a participant, returning their record so the caller can
    /// take them out of their room.
    pub fn quit(&mut self, id: ParticipantId) -> Option<Participant> {
        let participant = self.participants.remove(&id)?;
        tracing::info!(participant = %id, name = %participant.name, "participant logged out");
        Some(participant)
    }

    /// Looks up a participant by connection.
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Looks up a participant by display name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        self.participants
            .values()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Records which room a participant is in.
    ///
    /// # Errors
    /// Returns [`SessionError::NotLoggedIn`] for unknown connections.
    pub fn set_room(
        &mut self,
        id: ParticipantId,
        room: Option<String>,
    ) -> Result<(), SessionError> {
        let participant = self
            .participants
            .get_mut(&id)
            .ok_or(SessionError::NotLoggedIn(id))?;
        participant.room = room;
        Ok(())
    }

    /// Records a participant's away flag.
    ///
    /// # Errors
    /// Returns [`SessionError::NotLoggedIn`] for unknown connections.
    pub fn set_away(&mut self, id: ParticipantId, away: bool) -> Result<&Participant, SessionError> {
        let participant = self
            .participants
            .get_mut(&id)
            .ok_or(SessionError::NotLoggedIn(id))?;
        participant.away = away;
        Ok(participant)
    }

    /// Number of logged-in participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Returns `true` if nobody is logged in.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
