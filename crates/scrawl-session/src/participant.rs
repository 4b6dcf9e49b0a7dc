//! Participant types: the server's record of a logged-in connection.
//!
//! A participant is created on login and destroyed on disconnect. While
//! alive it tracks:
//! - WHO they are (`ParticipantId`, display name)
//! - WHERE they are (at most one room)
//! - WHETHER they're idle (the `away` flag)
//! - HOW to reach them (an outbound event channel)

use scrawl_protocol::{ParticipantId, ServerEvent};
use tokio::sync::mpsc;

/// Channel sender for delivering outbound events to one participant.
///
/// Unbounded so a room never waits on a slow client; the transport task
/// on the other end drains it at its own pace.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Shortest allowed display name.
pub const MIN_NAME_LEN: usize = 2;

/// Longest allowed display name.
pub const MAX_NAME_LEN: usize = 20;

/// Returns `true` if `name` is 2–20 ASCII letters, digits or underscores.
pub fn is_valid_name(name: &str) -> bool {
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A single logged-in participant.
#[derive(Debug, Clone)]
pub struct Participant {
    /// The connection this participant is bound to.
    pub id: ParticipantId,

    /// Display name, unique across the whole process (ignoring case).
    pub name: String,

    /// The room they are currently in, if any.
    pub room: Option<String>,

    /// Self-declared idle flag. Only authoritative while the participant
    /// is outside a room; inside one, the room owns the live value.
    pub away: bool,

    sender: EventSender,
}

impl Participant {
    pub(crate) fn new(id: ParticipantId, name: String, sender: EventSender) -> Self {
        Self {
            id,
            name,
            room: None,
            away: false,
            sender,
        }
    }

    /// Pushes an event to this participant. Silently drops it if the
    /// connection is already gone.
    pub fn send(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!(participant = %self.id, "outbound channel closed, event dropped");
        }
    }

    /// A clone of the outbound channel, for handing to a room.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Sends the `me` event describing this participant's own status.
    pub fn send_status(&self) {
        self.send(ServerEvent::Me {
            name: self.name.clone(),
            away: self.away,
        });
    }
}
