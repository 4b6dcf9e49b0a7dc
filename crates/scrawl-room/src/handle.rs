//! Room actor: an isolated Tokio task that owns a [`Room`].
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Inbound actions and ticks for one room are
//! queued on that channel and applied strictly in arrival order; rooms
//! share nothing, so different rooms run fully in parallel.

use scrawl_protocol::{ParticipantId, StrokeData};
use scrawl_session::EventSender;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::{PhraseSource, Room, RoomError, RoomInfo};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    Join {
        id: ParticipantId,
        name: String,
        away: bool,
        sender: EventSender,
        reply: oneshot::Sender<()>,
    },
    Part {
        id: ParticipantId,
        reply: oneshot::Sender<Option<bool>>,
    },
    Draw {
        id: ParticipantId,
        stroke: StrokeData,
    },
    Say {
        id: ParticipantId,
        msg: String,
    },
    Skip {
        id: ParticipantId,
    },
    Hint {
        id: ParticipantId,
    },
    SetPresence {
        id: ParticipantId,
        away: bool,
    },
    SetWordList {
        phrases: Box<dyn PhraseSource>,
    },
    Tick,
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// Handle to a running room actor.
///
/// Cheap to clone; it's just an `mpsc::Sender` and the room's name.
#[derive(Clone)]
pub struct RoomHandle {
    name: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle").field("name", &self.name).finish()
    }
}

impl RoomHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a participant and waits until they have received the room
    /// snapshot.
    pub async fn join(
        &self,
        id: ParticipantId,
        name: String,
        away: bool,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            id,
            name,
            away,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Removes a participant. Returns their last away flag, or `None` if
    /// they weren't in the room.
    pub async fn part(&self, id: ParticipantId) -> Result<Option<bool>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Part { id, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn draw(&self, id: ParticipantId, stroke: StrokeData) -> Result<(), RoomError> {
        self.send(RoomCommand::Draw { id, stroke }).await
    }

    pub async fn say(&self, id: ParticipantId, msg: String) -> Result<(), RoomError> {
        self.send(RoomCommand::Say { id, msg }).await
    }

    pub async fn skip(&self, id: ParticipantId) -> Result<(), RoomError> {
        self.send(RoomCommand::Skip { id }).await
    }

    pub async fn request_hint(&self, id: ParticipantId) -> Result<(), RoomError> {
        self.send(RoomCommand::Hint { id }).await
    }

    pub async fn set_presence(&self, id: ParticipantId, away: bool) -> Result<(), RoomError> {
        self.send(RoomCommand::SetPresence { id, away }).await
    }

    pub async fn set_word_list(&self, phrases: Box<dyn PhraseSource>) -> Result<(), RoomError> {
        self.send(RoomCommand::SetWordList { phrases }).await
    }

    /// Queues a tick without waiting.
    ///
    /// # Errors
    /// [`RoomError::Busy`] if the room's queue is full (the tick is
    /// dropped), [`RoomError::Unavailable`] if the actor is gone.
    pub fn tick(&self) -> Result<(), RoomError> {
        self.sender.try_send(RoomCommand::Tick).map_err(|e| match e {
            TrySendError::Full(_) => RoomError::Busy(self.name.clone()),
            TrySendError::Closed(_) => self.unavailable(),
        })
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.name.clone())
    }
}

/// Runs the actor loop until every handle is dropped.
async fn run(mut room: Room, mut receiver: mpsc::Receiver<RoomCommand>) {
    tracing::info!(room = %room.name(), "room actor started");

    while let Some(cmd) = receiver.recv().await {
        match cmd {
            RoomCommand::Join {
                id,
                name,
                away,
                sender,
                reply,
            } => {
                room.join(id, name, away, sender);
                let _ = reply.send(());
            }
            RoomCommand::Part { id, reply } => {
                let _ = reply.send(room.part(id));
            }
            RoomCommand::Draw { id, stroke } => room.draw(id, stroke.as_bytes()),
            RoomCommand::Say { id, msg } => room.say(id, &msg),
            RoomCommand::Skip { id } => room.skip(id),
            RoomCommand::Hint { id } => room.request_hint(id),
            RoomCommand::SetPresence { id, away } => room.set_presence(id, away),
            RoomCommand::SetWordList { phrases } => room.set_word_list(phrases),
            RoomCommand::Tick => room.think(),
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(room.info());
            }
        }
    }

    tracing::info!(room = %room.name(), "room actor stopped");
}

/// Spawns a room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue. Awaited commands wait for
/// space; ticks are dropped when it's full.
pub fn spawn_room(room: Room, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let name = room.name().to_string();
    tokio::spawn(run(room, rx));
    RoomHandle { name, sender: tx }
}
