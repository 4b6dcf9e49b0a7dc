//! Error types for the session layer.

use scrawl_protocol::ParticipantId;

/// Errors that can occur while logging participants in and out.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The requested display name breaks the naming rules.
    #[error("invalid name {0:?}")]
    InvalidName(String),

    /// Somebody else already uses this name (compared without case).
    #[error("name {0:?} is already in use")]
    NameInUse(String),

    /// This connection already logged in.
    #[error("participant {0} is already logged in")]
    AlreadyLoggedIn(ParticipantId),

    /// No participant is logged in on this connection.
    #[error("participant {0} is not logged in")]
    NotLoggedIn(ParticipantId),
}
