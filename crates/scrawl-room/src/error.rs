//! Error types for the room layer.

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this name exists.
    #[error("room {0:?} not found")]
    NotFound(String),

    /// A room with this name was already created.
    #[error("room {0:?} already exists")]
    AlreadyExists(String),

    /// The participant is already in this room.
    #[error("already in room {0:?}")]
    AlreadyInRoom(String),

    /// The room parameters break an invariant; the room is refused.
    #[error("invalid room parameters: {0}")]
    InvalidParams(String),

    /// A word list had no usable phrases.
    #[error("word list {0:?} has no phrases")]
    EmptyWordList(String),

    /// The room's command channel is closed.
    #[error("room {0:?} is unavailable")]
    Unavailable(String),

    /// The room's command channel is full.
    #[error("room {0:?} is busy")]
    Busy(String),
}
