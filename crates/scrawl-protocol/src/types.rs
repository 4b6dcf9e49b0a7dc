//! Core protocol types for Scrawl's wire vocabulary.
//!
//! Everything in this module either arrives from a participant
//! ([`ClientAction`]) or is pushed to one ([`ServerEvent`]). The room
//! engine never sees bytes; it produces and consumes these values, and a
//! [`Codec`](crate::Codec) turns them into frames at the edge.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identifier of a connected participant (one per connection).
///
/// A newtype over `u64` so it can't be mixed up with scores, round
/// numbers or pen indices. `#[serde(transparent)]` keeps it a plain
/// number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// StrokeData: opaque drawing commands
// ---------------------------------------------------------------------------

/// A blob of drawing commands.
///
/// The engine treats strokes as opaque bytes. JSON has no byte type, so
/// on the wire the bytes travel as a base64 string. Decoding a string
/// that isn't valid base64 fails the whole frame, which is how malformed
/// strokes get rejected before they ever reach a room.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrokeData(pub Vec<u8>);

impl StrokeData {
    /// Returns the raw command bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if there are no command bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for StrokeData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for StrokeData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for StrokeData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map(StrokeData)
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ClientAction: participant → server
// ---------------------------------------------------------------------------

/// Everything a participant can ask the server to do.
///
/// Adjacently tagged: `{ "action": "say", "data": { "msg": "hi" } }`.
/// Unit variants have no `data` field: `{ "action": "request_skip" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum ClientAction {
    /// Claim a display name for this connection.
    Login { username: String },

    /// Enter a named room (leaving the current one, if any).
    Join { room: String },

    /// A drawing command from an artist.
    Draw(StrokeData),

    /// A chat line, which may also be a guess.
    Say { msg: String },

    /// Artist gives up on the current phrase.
    RequestSkip,

    /// Artist reveals another letter of each word.
    RequestHint,

    /// Toggle the away flag.
    SetAway { away: bool },
}

// ---------------------------------------------------------------------------
// Payload value types
// ---------------------------------------------------------------------------

/// What kind of chat line this is. Clients style lines by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatKind {
    /// Ordinary message from a participant.
    Chat,
    /// Informational line from the server.
    Info,
    /// Round summary or skip notice.
    RoundEnd,
    /// Private confirmation of a correct guess.
    Correct,
    /// Private notice to an artist that someone got their phrase.
    GuessedYourWord,
    /// Private notice that a guess was nearly right.
    CloseGuess,
    /// A freshly revealed hint.
    Hint,
}

/// One line of chat, as sent and as kept in a room's backlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub msg: String,
    /// Author, for lines written by a participant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatEntry {
    /// A line with no author.
    pub fn system(kind: ChatKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            name: None,
        }
    }

    /// A line written by `name`.
    pub fn authored(kind: ChatKind, msg: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            name: Some(name.into()),
        }
    }
}

/// How one participant looks to everyone else in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub name: String,
    pub away: bool,
    pub score: i64,
    /// Whether they already guessed this round's phrase.
    pub guessed: bool,
}

/// A line of the end-of-game scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: i64,
}

/// The client-visible state of a running round.
///
/// Times are seconds as floats. `phrase` is only ever filled in for the
/// artists' copy of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub round: u32,
    pub artists: Vec<String>,
    pub elapsed_time: f64,
    pub remaining_time: f64,
    pub rush_phase: bool,
    pub guessers: Vec<String>,
    pub hint: Option<String>,
    pub can_skip: bool,
    pub hints_remaining: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
}

/// The full view of a room's current state, pushed on every transition
/// and on join.
///
/// Internally tagged on `state`: `{ "state": "guess", "round": 3, ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StateView {
    /// Not enough players yet.
    Wait,
    /// A round, as seen by one of its artists.
    Draw(RoundView),
    /// A round, as seen by a guesser.
    Guess(RoundView),
    /// The scoreboard intermission.
    Score { scores: Vec<ScoreEntry> },
}

/// A partial update to the current round view. Only the fields that
/// changed are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rush_phase: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_skip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints_remaining: Option<u32>,
}

/// A notice about a rejected request.
///
/// `then` tells the client what to do next (e.g. `"connect"` to go back
/// to the login screen).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<String>,
}

// ---------------------------------------------------------------------------
// ServerEvent: server → participant
// ---------------------------------------------------------------------------

/// Every event the server pushes to a participant.
///
/// Adjacently tagged: `{ "event": "user_part", "data": { "name": "ann" } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Login accepted.
    Welcome { username: String },
    /// The participant's own name and presence.
    Me { name: String, away: bool },
    /// Full state view.
    State(StateView),
    /// Roster snapshot sent to a participant who just joined.
    Room {
        name: String,
        users: Vec<ParticipantView>,
    },
    /// A chat line.
    Chat(ChatEntry),
    /// Enveloped drawing commands (relay or replay).
    Draw(StrokeData),
    /// Updated scores for some participants.
    Scores { scores: Vec<ParticipantView> },
    /// Partial round view update.
    StateUpdate(StateUpdate),
    /// Someone entered the room.
    UserJoin { name: String, score: i64, away: bool },
    /// Someone left the room.
    UserPart { name: String },
    /// Someone's presence or score changed.
    UserStatus(ParticipantView),
    /// Someone guessed correctly.
    GuessCorrect,
    /// The scoreboard was wiped for a new game.
    ScoresReset,
    /// A request was rejected.
    Alert(Alert),
}

impl ServerEvent {
    /// Shorthand for a chat event.
    pub fn chat(entry: ChatEntry) -> Self {
        Self::Chat(entry)
    }

    /// Shorthand for an alert with no follow-up.
    pub fn alert(message: impl Into<String>) -> Self {
        Self::Alert(Alert {
            message: message.into(),
            then: None,
        })
    }

    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Me { .. } => "me",
            Self::State(_) => "state",
            Self::Room { .. } => "room",
            Self::Chat(_) => "chat",
            Self::Draw(_) => "draw",
            Self::Scores { .. } => "scores",
            Self::StateUpdate(_) => "state_update",
            Self::UserJoin { .. } => "user_join",
            Self::UserPart { .. } => "user_part",
            Self::UserStatus(_) => "user_status",
            Self::GuessCorrect => "guess_correct",
            Self::ScoresReset => "scores_reset",
            Self::Alert(_) => "alert",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! JSON shapes are what the browser client parses, so these tests pin
    //! the serde attributes down.

    use super::*;

    // =====================================================================
    // Identity
    // =====================================================================

    #[test]
    fn test_participant_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ParticipantId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_participant_id_display() {
        assert_eq!(ParticipantId(7).to_string(), "P-7");
    }

    // =====================================================================
    // StrokeData
    // =====================================================================

    #[test]
    fn test_stroke_data_serializes_as_base64() {
        let json = serde_json::to_string(&StrokeData(vec![0, 5, 255])).unwrap();
        assert_eq!(json, "\"AAX/\"");
    }

    #[test]
    fn test_stroke_data_rejects_invalid_base64() {
        let result: Result<StrokeData, _> = serde_json::from_str("\"not base64!\"");
        assert!(result.is_err());
    }

    // =====================================================================
    // ClientAction
    // =====================================================================

    #[test]
    fn test_client_action_say_json_format() {
        let action: ClientAction =
            serde_json::from_str(r#"{"action":"say","data":{"msg":"apple?"}}"#).unwrap();
        assert_eq!(
            action,
            ClientAction::Say {
                msg: "apple?".into()
            }
        );
    }

    #[test]
    fn test_client_action_unit_variant_has_no_data() {
        let action: ClientAction =
            serde_json::from_str(r#"{"action":"request_hint"}"#).unwrap();
        assert_eq!(action, ClientAction::RequestHint);
    }

    #[test]
    fn test_client_action_draw_decodes_base64_payload() {
        let action: ClientAction =
            serde_json::from_str(r#"{"action":"draw","data":"AwEC"}"#).unwrap();
        assert_eq!(action, ClientAction::Draw(StrokeData(vec![3, 1, 2])));
    }

    #[test]
    fn test_client_action_draw_with_garbage_fails() {
        let result: Result<ClientAction, _> =
            serde_json::from_str(r#"{"action":"draw","data":"%%%"}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_server_event_chat_json_format() {
        let event = ServerEvent::chat(ChatEntry::authored(ChatKind::Chat, "hello", "ann"));
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "chat");
        assert_eq!(json["data"]["type"], "chat");
        assert_eq!(json["data"]["msg"], "hello");
        assert_eq!(json["data"]["name"], "ann");
    }

    #[test]
    fn test_system_chat_omits_name() {
        let event = ServerEvent::chat(ChatEntry::system(ChatKind::RoundEnd, "done"));
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["data"]["type"], "round-end");
        assert!(json["data"].get("name").is_none());
    }

    #[test]
    fn test_state_view_is_tagged_by_state() {
        let event = ServerEvent::State(StateView::Wait);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "state");
        assert_eq!(json["data"]["state"], "wait");
    }

    #[test]
    fn test_guess_view_hides_phrase() {
        let view = RoundView {
            round: 2,
            artists: vec!["ann".into()],
            elapsed_time: 1.0,
            remaining_time: 10.0,
            rush_phase: false,
            guessers: vec![],
            hint: None,
            can_skip: true,
            hints_remaining: 2,
            phrase: None,
        };
        let json: serde_json::Value = serde_json::to_value(StateView::Guess(view)).unwrap();

        assert_eq!(json["state"], "guess");
        assert_eq!(json["round"], 2);
        assert!(json.get("phrase").is_none());
        assert!(json["hint"].is_null());
    }

    #[test]
    fn test_state_update_only_carries_changed_fields() {
        let update = StateUpdate {
            hint: Some("a____".into()),
            ..StateUpdate::default()
        };
        let json: serde_json::Value = serde_json::to_value(&update).unwrap();

        assert_eq!(json, serde_json::json!({ "hint": "a____" }));
    }

    #[test]
    fn test_unit_events_and_names() {
        let json: serde_json::Value = serde_json::to_value(ServerEvent::ScoresReset).unwrap();
        assert_eq!(json["event"], "scores_reset");
        assert_eq!(ServerEvent::GuessCorrect.name(), "guess_correct");
        assert_eq!(ServerEvent::alert("nope").name(), "alert");
    }
}
