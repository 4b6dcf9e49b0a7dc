//! `GameServer`: the event dispatcher between connections and rooms.
//!
//! This is the entry point for hosting Scrawl. It ties the layers
//! together: frames → protocol → sessions → rooms. The transport itself
//! (sockets, HTTP) lives outside; it calls [`GameServer::connect`] for
//! each new connection, feeds inbound frames to
//! [`GameServer::handle_frame`], drains the returned event receiver, and
//! calls [`GameServer::disconnect`] when the connection goes away.
//!
//! # Locking
//!
//! Sessions and rooms each sit behind their own `Mutex`. When both are
//! needed, sessions are locked first. Neither lock is held while waiting
//! on a room actor: routing happens under the lock, then the guard is
//! dropped and the cloned [`RoomHandle`] is awaited. A slow room can't
//! stall the ticker or anyone else's actions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use scrawl_protocol::{Alert, ClientAction, Codec, JsonCodec, ParticipantId, ServerEvent};
use scrawl_room::{PhraseSource, RoomError, RoomHandle, RoomInfo, RoomParams, RoomRegistry};
use scrawl_session::{EventSender, ParticipantRegistry, SessionError};
use scrawl_tick::{TickConfig, TickScheduler};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::{ScrawlError, ServerConfig, WordListDirectory};

const NAME_IN_USE: &str = "That name is in use.";
const INVALID_NAME: &str = "You need an alphanumeric name between 2 and 20 characters long.";
const NO_SUCH_ROOM: &str = "The given room doesn't exist yet.";

/// What a client is told to do after a failed login.
const THEN_CONNECT: &str = "connect";

/// Receiving end of a connection's outbound events.
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Outcome of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginResult {
    LoggedIn,
    NameInUse,
    InvalidName,
    AlreadyLoggedIn,
    /// The connection was never opened with [`GameServer::connect`], or
    /// is already gone.
    NotConnected,
}

/// Outcome of a join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinResult {
    Joined,
    /// Already in that room; nothing happened.
    AlreadyInRoom,
    RoomNotFound,
    NotLoggedIn,
}

/// Open connections and the participants logged in on them.
#[derive(Debug, Default)]
struct Sessions {
    /// Outbound channel of every open connection, logged in or not.
    connections: HashMap<ParticipantId, EventSender>,
    participants: ParticipantRegistry,
}

/// Shared server state.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
struct ServerState<C: Codec> {
    sessions: Mutex<Sessions>,
    rooms: Mutex<RoomRegistry>,
    words: WordListDirectory,
    codec: C,
    next_id: AtomicU64,
}

/// A Scrawl game server.
///
/// Cheap to clone; clones share the same rooms and participants.
pub struct GameServer<C: Codec = JsonCodec> {
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Clone for GameServer<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl GameServer<JsonCodec> {
    /// Creates a server with no rooms that speaks JSON.
    pub fn new(words: WordListDirectory) -> Self {
        Self::with_codec(words, JsonCodec)
    }

    /// Creates a server and every room listed in `config`.
    ///
    /// Must be called inside a Tokio runtime, since each room runs as a
    /// task.
    ///
    /// # Errors
    /// Fails on the first room whose word list can't be loaded or whose
    /// parameters are invalid.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ScrawlError> {
        let server = Self::new(WordListDirectory::new(&config.word_list_dir));
        for room in &config.rooms {
            let phrases = server.state.words.chooser(&room.word_list)?;
            server
                .create_room(&room.name, Box::new(phrases), room.params.clone())
                .await?;
        }
        Ok(server)
    }
}

impl<C: Codec> GameServer<C> {
    pub fn with_codec(words: WordListDirectory, codec: C) -> Self {
        Self {
            state: Arc::new(ServerState {
                sessions: Mutex::new(Sessions::default()),
                rooms: Mutex::new(RoomRegistry::new()),
                words,
                codec,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    // -- rooms ----------------------------------------------------------

    /// Creates a room and starts its actor.
    ///
    /// # Errors
    /// [`RoomError::AlreadyExists`] or [`RoomError::InvalidParams`].
    pub async fn create_room(
        &self,
        name: &str,
        phrases: Box<dyn PhraseSource>,
        params: RoomParams,
    ) -> Result<RoomHandle, ScrawlError> {
        Ok(self.state.rooms.lock().await.create(name, phrases, params)?)
    }

    /// Swaps a room's word list for the list called `word_list`.
    ///
    /// # Errors
    /// Fails if the list can't be loaded or the room doesn't exist.
    pub async fn set_word_list(&self, room: &str, word_list: &str) -> Result<(), ScrawlError> {
        let phrases = self.state.words.chooser(word_list)?;
        let handle = self.state.rooms.lock().await.get(room)?.clone();
        handle.set_word_list(Box::new(phrases)).await?;
        Ok(())
    }

    pub async fn room_info(&self, room: &str) -> Result<RoomInfo, ScrawlError> {
        let handle = self.state.rooms.lock().await.get(room)?.clone();
        Ok(handle.info().await?)
    }

    pub async fn room_names(&self) -> Vec<String> {
        self.state.rooms.lock().await.room_names()
    }

    /// Spawns the task that ticks every room at `config`'s rate.
    ///
    /// The task ends once every clone of this server has been dropped.
    /// With a rate of 0 it ends straight away.
    pub fn spawn_ticker(&self, config: TickConfig) -> JoinHandle<()> {
        let state: Weak<ServerState<C>> = Arc::downgrade(&self.state);
        tokio::spawn(async move {
            let mut scheduler = TickScheduler::new(config);
            if scheduler.is_disabled() {
                tracing::info!("room ticking disabled");
                return;
            }
            tracing::info!(rate_hz = scheduler.tick_rate_hz(), "room ticker started");

            loop {
                let tick = scheduler.wait_for_tick().await;
                if tick.overrun {
                    tracing::debug!(
                        tick = tick.tick,
                        skipped = tick.ticks_skipped,
                        "ticker fell behind"
                    );
                }
                let Some(live) = state.upgrade() else {
                    break;
                };
                live.rooms.lock().await.tick_all();
            }

            tracing::info!("room ticker stopped");
        })
    }

    // -- connections ----------------------------------------------------

    /// Opens a connection. Events for it arrive on the returned receiver.
    pub async fn connect(&self) -> (ParticipantId, EventReceiver) {
        let id = ParticipantId(self.state.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.sessions.lock().await.connections.insert(id, tx);
        tracing::debug!(participant = %id, "connection opened");
        (id, rx)
    }

    /// Closes a connection, taking its participant out of their room.
    pub async fn disconnect(&self, id: ParticipantId) {
        let participant = {
            let mut sessions = self.state.sessions.lock().await;
            sessions.connections.remove(&id);
            sessions.participants.quit(id)
        };
        let Some(participant) = participant else {
            tracing::debug!(participant = %id, "unnamed connection closed");
            return;
        };

        self.part_from_room(id).await;
        tracing::debug!(participant = %id, name = %participant.name, "disconnected");
    }

    /// Takes a participant out of whatever room the registry has them in.
    async fn part_from_room(&self, id: ParticipantId) {
        let handle = self.state.rooms.lock().await.leave(id);
        if let Some(handle) = handle {
            if let Err(e) = handle.part(id).await {
                tracing::warn!(participant = %id, error = %e, "failed to part");
            }
        }
    }

    /// Claims a display name for a connection.
    ///
    /// On success the participant gets `me` then `welcome`. A taken or
    /// malformed name gets an alert sending the client back to connect.
    pub async fn login(&self, id: ParticipantId, username: &str) -> LoginResult {
        let mut sessions = self.state.sessions.lock().await;
        let Some(sender) = sessions.connections.get(&id).cloned() else {
            return LoginResult::NotConnected;
        };

        let (result, message) = match sessions.participants.login(id, username, sender.clone()) {
            Ok(participant) => {
                participant.send_status();
                participant.send(ServerEvent::Welcome {
                    username: participant.name.clone(),
                });
                return LoginResult::LoggedIn;
            }
            Err(SessionError::NameInUse(_)) => (LoginResult::NameInUse, NAME_IN_USE),
            Err(SessionError::InvalidName(_)) => (LoginResult::InvalidName, INVALID_NAME),
            Err(e) => {
                tracing::debug!(participant = %id, error = %e, "login ignored");
                return LoginResult::AlreadyLoggedIn;
            }
        };

        tracing::debug!(participant = %id, username, ?result, "login refused");
        let alert = ServerEvent::Alert(Alert {
            message: message.to_string(),
            then: Some(THEN_CONNECT.to_string()),
        });
        send_to(id, &sender, alert);
        result
    }

    /// Moves a participant into `room`, leaving any room they were in.
    ///
    /// # Errors
    /// Only if the room actor is gone. Policy outcomes are in
    /// [`JoinResult`].
    pub async fn join(&self, id: ParticipantId, room: &str) -> Result<JoinResult, ScrawlError> {
        let (name, away, sender) = {
            let sessions = self.state.sessions.lock().await;
            let Some(participant) = sessions.participants.get(&id) else {
                return Ok(JoinResult::NotLoggedIn);
            };
            (participant.name.clone(), participant.away, participant.sender())
        };

        let relocation = self.state.rooms.lock().await.relocate(id, room);
        let relocation = match relocation {
            Ok(relocation) => relocation,
            Err(RoomError::AlreadyInRoom(_)) => return Ok(JoinResult::AlreadyInRoom),
            Err(RoomError::NotFound(_)) => {
                tracing::debug!(participant = %id, %name, %room, "tried to join non-existent room");
                send_to(id, &sender, ServerEvent::alert(NO_SUCH_ROOM));
                return Ok(JoinResult::RoomNotFound);
            }
            Err(e) => return Err(e.into()),
        };
        relocation.apply(id, name, away, sender).await?;

        let recorded = self
            .state
            .sessions
            .lock()
            .await
            .participants
            .set_room(id, Some(room.to_string()));
        match recorded {
            Ok(()) => Ok(JoinResult::Joined),
            Err(SessionError::NotLoggedIn(_)) => {
                // Disconnected while the rooms were busy.
                self.part_from_room(id).await;
                Ok(JoinResult::NotLoggedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Sets a participant's away flag.
    ///
    /// Inside a room the room tells everyone (and the participant);
    /// outside one only the participant hears back.
    pub async fn set_away(&self, id: ParticipantId, away: bool) -> Result<(), ScrawlError> {
        let status = {
            let mut sessions = self.state.sessions.lock().await;
            match sessions.participants.set_away(id, away) {
                Ok(participant) => ServerEvent::Me {
                    name: participant.name.clone(),
                    away,
                },
                Err(SessionError::NotLoggedIn(_)) => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        };

        let handle = self.state.rooms.lock().await.room_of(id).cloned();
        match handle {
            Some(handle) => handle.set_presence(id, away).await?,
            None => {
                if let Some(participant) = self.state.sessions.lock().await.participants.get(&id) {
                    participant.send(status);
                }
            }
        }
        Ok(())
    }

    // -- dispatch -------------------------------------------------------

    /// Applies one action from a connection.
    ///
    /// Actions from connections that haven't logged in, and in-room
    /// actions from participants who aren't in a room, are ignored.
    pub async fn handle(&self, id: ParticipantId, action: ClientAction) -> Result<(), ScrawlError> {
        match action {
            ClientAction::Login { username } => {
                self.login(id, &username).await;
            }
            ClientAction::Join { room } => {
                self.join(id, &room).await?;
            }
            ClientAction::SetAway { away } => self.set_away(id, away).await?,
            ClientAction::Say { msg } if msg.trim().is_empty() => {}
            in_room => {
                let Some(handle) = self.state.rooms.lock().await.room_of(id).cloned() else {
                    tracing::trace!(participant = %id, "action outside a room ignored");
                    return Ok(());
                };
                match in_room {
                    ClientAction::Draw(stroke) => handle.draw(id, stroke).await?,
                    ClientAction::Say { msg } => handle.say(id, msg).await?,
                    ClientAction::RequestSkip => handle.skip(id).await?,
                    ClientAction::RequestHint => handle.request_hint(id).await?,
                    ClientAction::Login { .. }
                    | ClientAction::Join { .. }
                    | ClientAction::SetAway { .. } => {}
                }
            }
        }
        Ok(())
    }

    /// Decodes an inbound frame and applies it. Frames that don't decode
    /// are dropped with a warning.
    pub async fn handle_frame(&self, id: ParticipantId, frame: &[u8]) -> Result<(), ScrawlError> {
        let action: ClientAction = match self.state.codec.decode(frame) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(participant = %id, error = %e, "dropping undecodable frame");
                return Ok(());
            }
        };
        self.handle(id, action).await
    }

    /// Encodes an outbound event with this server's codec.
    pub fn encode(&self, event: &ServerEvent) -> Result<Vec<u8>, ScrawlError> {
        Ok(self.state.codec.encode(event)?)
    }

    /// Number of logged-in participants.
    pub async fn participant_count(&self) -> usize {
        self.state.sessions.lock().await.participants.len()
    }
}

/// Best-effort send on a connection that may already be gone.
fn send_to(id: ParticipantId, sender: &EventSender, event: ServerEvent) {
    if sender.send(event).is_err() {
        tracing::trace!(participant = %id, "outbound channel closed, event dropped");
    }
}
