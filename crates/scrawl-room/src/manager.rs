//! Room registry: creates rooms, tracks who is where, drives ticks.

use std::collections::HashMap;

use scrawl_protocol::ParticipantId;
use scrawl_session::EventSender;

use crate::handle::spawn_room;
use crate::{PhraseSource, Room, RoomError, RoomHandle, RoomInfo, RoomParams};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// A move between rooms that the registry has already recorded.
#[derive(Debug)]
pub struct Relocation {
    /// The room being left, if any.
    pub from: Option<RoomHandle>,
    /// The room being joined.
    pub to: RoomHandle,
}

impl Relocation {
    /// Parts the old room, then joins the new one. The away flag the old
    /// room last knew wins over `away`.
    pub async fn apply(
        self,
        id: ParticipantId,
        name: String,
        away: bool,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let away = match &self.from {
            Some(old) => old.part(id).await?.unwrap_or(away),
            None => away,
        };
        self.to.join(id, name, away, sender).await
    }
}

/// Owns every room and remembers which room each participant is in.
///
/// Rooms are created at configuration time and live as long as the
/// registry. A participant is in at most one room at a time.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Running rooms, keyed by name.
    rooms: HashMap<String, RoomHandle>,

    /// Maps each participant to the room they're currently in.
    locations: HashMap<ParticipantId, String>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room and starts its actor.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyExists`] if the name is taken
    /// - [`RoomError::InvalidParams`] if `params` break an invariant
    pub fn create(
        &mut self,
        name: &str,
        phrases: Box<dyn PhraseSource>,
        params: RoomParams,
    ) -> Result<RoomHandle, RoomError> {
        if self.rooms.contains_key(name) {
            return Err(RoomError::AlreadyExists(name.to_string()));
        }
        let room = Room::new(name, phrases, params)?;
        let handle = spawn_room(room, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Looks up a room by name.
    pub fn get(&self, name: &str) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(name)
            .ok_or_else(|| RoomError::NotFound(name.to_string()))
    }

    /// Moves a participant into `room`, parting whatever room they were
    /// in. Their away flag carries over from the old room if they had one.
    ///
    /// Holds `&mut self` across the room actors' replies; a registry shared
    /// behind a lock should use [`relocate`](Self::relocate) instead.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if `room` doesn't exist; the participant
    ///   stays where they were
    /// - [`RoomError::AlreadyInRoom`] if they're already in `room`
    pub async fn join(
        &mut self,
        id: ParticipantId,
        name: &str,
        away: bool,
        sender: EventSender,
        room: &str,
    ) -> Result<(), RoomError> {
        self.relocate(id, room)?
            .apply(id, name.to_string(), away, sender)
            .await
    }

    /// Records that a participant is moving into `room` without talking
    /// to either room. The returned [`Relocation`] carries the handles to
    /// finish the move with.
    ///
    /// # Errors
    /// Same as [`join`](Self::join); on error nothing is recorded.
    pub fn relocate(&mut self, id: ParticipantId, room: &str) -> Result<Relocation, RoomError> {
        let to = self.get(room)?.clone();
        if self.locations.get(&id).is_some_and(|current| current == room) {
            return Err(RoomError::AlreadyInRoom(room.to_string()));
        }
        let from = self.leave(id);
        self.locations.insert(id, room.to_string());
        Ok(Relocation { from, to })
    }

    /// Takes a participant out of their room, if any. Returns their away
    /// flag as that room last knew it.
    pub async fn part(&mut self, id: ParticipantId) -> Result<Option<bool>, RoomError> {
        match self.leave(id) {
            Some(handle) => handle.part(id).await,
            None => Ok(None),
        }
    }

    /// Forgets where a participant is and returns that room's handle, so
    /// the caller can [`part`](RoomHandle::part) them from it.
    pub fn leave(&mut self, id: ParticipantId) -> Option<RoomHandle> {
        let room = self.locations.remove(&id)?;
        self.rooms.get(&room).cloned()
    }

    /// The room a participant is in, if any.
    pub fn room_of(&self, id: ParticipantId) -> Option<&RoomHandle> {
        self.locations.get(&id).and_then(|room| self.rooms.get(room))
    }

    /// Queues a tick on every room without waiting on any of them.
    ///
    /// A room whose queue is full misses this tick; the others are
    /// unaffected.
    pub fn tick_all(&self) {
        for handle in self.rooms.values() {
            match handle.tick() {
                Ok(()) => {}
                Err(RoomError::Busy(room)) => {
                    tracing::debug!(%room, "room busy, tick dropped");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to tick room");
                }
            }
        }
    }

    /// Replaces a room's phrase source.
    pub async fn set_word_list(
        &self,
        room: &str,
        phrases: Box<dyn PhraseSource>,
    ) -> Result<(), RoomError> {
        self.get(room)?.set_word_list(phrases).await
    }

    pub async fn info(&self, room: &str) -> Result<RoomInfo, RoomError> {
        self.get(room)?.info().await
    }

    /// Sorted room names.
    pub fn room_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rooms.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
