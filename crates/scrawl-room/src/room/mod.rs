//! The room: single mutation boundary and broadcast gateway.
//!
//! A [`Room`] owns its roster, scores, chat backlog and exactly one active
//! state. Every inbound action and every tick goes through it, and every
//! state change is pushed to all members before the call returns.
//!
//! `Room` itself is synchronous. Serialising access to it is the job of
//! the room actor (see [`RoomHandle`](crate::RoomHandle)).

mod round;
mod scoring;

use scrawl_protocol::{ChatEntry, ChatKind, ParticipantId, ParticipantView, ServerEvent, StateView, StrokeData};
use scrawl_session::EventSender;
use tokio::time::Instant;

use crate::chat::ChatBacklog;
use crate::roster::{Member, Roster};
use crate::score::ScoreBoard;
use crate::{PhraseSource, RoomError, RoomParams, RoundPhase};

use round::Round;
use scoring::Scoring;

pub use round::TOTAL_HINTS;

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub name: String,
    pub phase: RoundPhase,
    /// Current round, starting at 1.
    pub round: u32,
    pub participant_count: usize,
    /// Participants not marked away.
    pub active_count: usize,
    /// Name of the word list phrases are drawn from.
    pub word_list: String,
}

/// The active state. Exactly one per room.
enum RoundState {
    Waiting,
    Round(Round),
    Scoring(Scoring),
}

/// What the active state asks the room to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Nothing changes.
    Stay,
    /// Waiting → Round.
    StartRound,
    /// Next round, or scoring once the round limit is reached.
    Advance,
    /// Not enough active players: reset and wait.
    Wait,
    /// Intermission over: new game from round 1.
    NewGame,
}

/// Everything a state may touch besides itself.
struct Ctx<'a> {
    room: &'a str,
    roster: &'a mut Roster,
    scores: &'a mut ScoreBoard,
    backlog: &'a mut ChatBacklog,
    params: &'a crate::RoomParams,
}

impl Ctx<'_> {
    /// At least one active member and a full enough roster.
    fn has_enough_players(&self) -> bool {
        self.roster.active_count() >= 1 && self.roster.len() >= self.params.min_player_count
    }

    /// Broadcasts a chat line and keeps it in the backlog.
    fn announce(&mut self, entry: ChatEntry) {
        self.backlog.push(entry.clone());
        self.roster.broadcast(&ServerEvent::Chat(entry));
    }
}

/// Builds the status other participants see for `member`.
fn status_view(member: &Member, scores: &ScoreBoard, round: Option<&Round>) -> ParticipantView {
    ParticipantView {
        name: member.name.clone(),
        away: member.away,
        score: scores.get(&member.name),
        guessed: round.is_some_and(|r| r.has_guessed(member.id)),
    }
}

/// Tells the room about `id`'s status and sends them their own `me`.
fn notify_status(roster: &Roster, scores: &ScoreBoard, round: Option<&Round>, id: ParticipantId) {
    let Some(member) = roster.get(id) else {
        return;
    };
    roster.broadcast(&ServerEvent::UserStatus(status_view(member, scores, round)));
    member.send(ServerEvent::Me {
        name: member.name.clone(),
        away: member.away,
    });
}

/// Seconds from `from` to `to`, negative if `to` is earlier.
fn signed_secs(to: Instant, from: Instant) -> f64 {
    if to >= from {
        (to - from).as_secs_f64()
    } else {
        -(from - to).as_secs_f64()
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A named game room.
pub struct Room {
    name: String,
    params: RoomParams,
    phrases: Box<dyn PhraseSource>,
    roster: Roster,
    scores: ScoreBoard,
    backlog: ChatBacklog,
    round_number: u32,
    state: RoundState,
}

impl Room {
    /// Creates a room in the waiting state.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidParams`] if `params` fail
    /// [`RoomParams::validate`].
    pub fn new(
        name: impl Into<String>,
        phrases: Box<dyn PhraseSource>,
        params: RoomParams,
    ) -> Result<Self, RoomError> {
        params.validate()?;
        let name = name.into();
        tracing::info!(room = %name, word_list = phrases.name(), "room created");
        Ok(Self {
            name,
            params,
            phrases,
            roster: Roster::default(),
            scores: ScoreBoard::new(),
            backlog: ChatBacklog::new(),
            round_number: 1,
            state: RoundState::Waiting,
        })
    }

    // -- actions ------------------------------------------------------------

    /// Adds a participant to the roster. A no-op if they're already in it.
    ///
    /// Everyone else hears `user_join` first. The joiner then gets the
    /// roster, the chat backlog, the current state (with the drawing so
    /// far, mid-round) and a welcome line.
    pub fn join(&mut self, id: ParticipantId, name: String, away: bool, sender: EventSender) {
        if self.roster.contains(id) {
            return;
        }
        tracing::debug!(room = %self.name, participant = %id, name = %name, "participant joined");

        self.roster.broadcast(&ServerEvent::UserJoin {
            name: name.clone(),
            score: self.scores.get(&name),
            away,
        });
        self.roster.push(Member::new(id, name, away, sender));

        let users = self
            .roster
            .iter()
            .map(|m| self.participant_view(m))
            .collect();
        self.roster.send_to(
            id,
            ServerEvent::Room {
                name: self.name.clone(),
                users,
            },
        );
        for entry in self.backlog.iter() {
            self.roster.send_to(id, ServerEvent::Chat(entry.clone()));
        }
        for event in self.state_events(id, Instant::now()) {
            self.roster.send_to(id, event);
        }
        self.roster.send_to(
            id,
            ServerEvent::Chat(ChatEntry::system(
                ChatKind::Info,
                format!(
                    "You've joined room **#{}** using word list **{}**.",
                    self.name,
                    self.phrases.name()
                ),
            )),
        );
    }

    /// Removes a participant. Returns their away flag as the room last
    /// knew it, or `None` if they weren't here.
    pub fn part(&mut self, id: ParticipantId) -> Option<bool> {
        let member = self.roster.remove(id)?;
        tracing::debug!(room = %self.name, participant = %id, name = %member.name, "participant parted");

        if let RoundState::Round(round) = &mut self.state {
            round.part(id);
        }
        self.roster.broadcast(&ServerEvent::UserPart {
            name: member.name.clone(),
        });
        Some(member.away)
    }

    /// Relays a stroke from an artist. Anything else is ignored.
    pub fn draw(&mut self, id: ParticipantId, stroke: &[u8]) {
        let (state, ctx) = self.split();
        if let RoundState::Round(round) = state {
            round.draw(&ctx, id, stroke);
        }
    }

    /// Handles a chat line: a guess, a close guess, or plain chat.
    pub fn say(&mut self, id: ParticipantId, message: &str) {
        if message.trim().is_empty() {
            return;
        }
        let Some(name) = self.roster.get(id).map(|m| m.name.clone()) else {
            return;
        };

        let now = Instant::now();
        let (state, mut ctx) = self.split();
        let handled = match state {
            RoundState::Round(round) => round.say(&mut ctx, id, message, now),
            _ => None,
        };

        match handled {
            Some(step) => self.apply(step),
            None => {
                let (_, mut ctx) = self.split();
                ctx.announce(ChatEntry::authored(ChatKind::Chat, message, name));
            }
        }
    }

    /// An artist gives up on the round.
    pub fn skip(&mut self, id: ParticipantId) {
        let (state, mut ctx) = self.split();
        if let RoundState::Round(round) = state {
            let step = round.skip(&mut ctx, id);
            self.apply(step);
        }
    }

    /// An artist reveals another letter of each word.
    pub fn request_hint(&mut self, id: ParticipantId) {
        let (state, mut ctx) = self.split();
        if let RoundState::Round(round) = state {
            round.hint(&mut ctx, id);
        }
    }

    /// Sets a member's away flag and tells the room.
    pub fn set_presence(&mut self, id: ParticipantId, away: bool) {
        let Some(member) = self.roster.get_mut(id) else {
            return;
        };
        member.away = away;
        notify_status(&self.roster, &self.scores, self.round(), id);
    }

    /// Swaps the phrase source. The current round keeps its phrase.
    pub fn set_word_list(&mut self, phrases: Box<dyn PhraseSource>) {
        tracing::info!(room = %self.name, word_list = phrases.name(), "word list changed");
        self.phrases = phrases;
        let message = format!("The word list is now **{}**.", self.phrases.name());
        let (_, mut ctx) = self.split();
        ctx.announce(ChatEntry::system(ChatKind::Info, message));
    }

    /// Evaluates timers and player counts, transitioning if needed.
    pub fn think(&mut self) {
        let now = Instant::now();
        let (state, mut ctx) = self.split();
        let step = match state {
            RoundState::Waiting if ctx.has_enough_players() => Transition::StartRound,
            RoundState::Waiting => Transition::Stay,
            RoundState::Round(round) => round.think(&mut ctx, now),
            RoundState::Scoring(scoring) => scoring.think(now),
        };
        self.apply(step);
    }

    // -- queries ------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &RoomParams {
        &self.params
    }

    pub fn phase(&self) -> RoundPhase {
        match self.state {
            RoundState::Waiting => RoundPhase::Waiting,
            RoundState::Round(_) => RoundPhase::Round,
            RoundState::Scoring(_) => RoundPhase::Scoring,
        }
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn word_list(&self) -> &str {
        self.phrases.name()
    }

    pub fn score_of(&self, name: &str) -> i64 {
        self.scores.get(name)
    }

    pub fn is_member(&self, id: ParticipantId) -> bool {
        self.roster.contains(id)
    }

    pub fn is_away(&self, id: ParticipantId) -> Option<bool> {
        self.roster.get(id).map(|m| m.away)
    }

    /// Member names in rotation order; the front draws next.
    pub fn roster_names(&self) -> Vec<String> {
        self.roster.iter().map(|m| m.name.clone()).collect()
    }

    /// Names of the current artists. Empty outside a round.
    pub fn artists(&self) -> Vec<String> {
        self.round()
            .map(|r| r.artists().iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has_guessed(&self, id: ParticipantId) -> bool {
        self.round().is_some_and(|r| r.has_guessed(id))
    }

    pub fn current_phrase(&self) -> Option<&str> {
        self.round().map(Round::phrase)
    }

    pub fn current_hint(&self) -> Option<&str> {
        self.round().and_then(Round::current_hint)
    }

    pub fn hints_remaining(&self) -> Option<u32> {
        self.round().map(Round::hints_remaining)
    }

    pub fn can_skip(&self) -> Option<bool> {
        self.round().map(Round::can_skip)
    }

    pub fn in_rush_phase(&self) -> bool {
        self.round().is_some_and(Round::in_rush_phase)
    }

    /// The drawing so far, as a late joiner would receive it.
    pub fn stroke_replay(&self) -> Vec<u8> {
        self.round().map(Round::replay).unwrap_or_default()
    }

    pub fn chat_backlog(&self) -> impl Iterator<Item = &ChatEntry> {
        self.backlog.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.roster.len()
    }

    pub fn active_count(&self) -> usize {
        self.roster.active_count()
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            name: self.name.clone(),
            phase: self.phase(),
            round: self.round_number,
            participant_count: self.roster.len(),
            active_count: self.roster.active_count(),
            word_list: self.phrases.name().to_string(),
        }
    }

    // -- internals ----------------------------------------------------------

    fn round(&self) -> Option<&Round> {
        match &self.state {
            RoundState::Round(round) => Some(round),
            _ => None,
        }
    }

    fn split(&mut self) -> (&mut RoundState, Ctx<'_>) {
        (
            &mut self.state,
            Ctx {
                room: &self.name,
                roster: &mut self.roster,
                scores: &mut self.scores,
                backlog: &mut self.backlog,
                params: &self.params,
            },
        )
    }

    fn participant_view(&self, member: &Member) -> ParticipantView {
        status_view(member, &self.scores, self.round())
    }

    /// What `id` needs to see the current state from scratch.
    fn state_events(&self, id: ParticipantId, now: Instant) -> Vec<ServerEvent> {
        match &self.state {
            RoundState::Waiting => vec![ServerEvent::State(StateView::Wait)],
            RoundState::Round(round) => {
                let mut events = vec![ServerEvent::State(round.view(id, self.round_number, now))];
                let replay = round.replay();
                if !replay.is_empty() {
                    events.push(ServerEvent::Draw(StrokeData(replay)));
                }
                events
            }
            RoundState::Scoring(scoring) => vec![ServerEvent::State(scoring.view())],
        }
    }

    fn apply(&mut self, step: Transition) {
        match step {
            Transition::Stay => {}
            Transition::StartRound => self.start_round(),
            Transition::Advance => {
                if self.round_number < self.params.round_limit {
                    self.round_number += 1;
                    self.start_round();
                } else {
                    self.start_scoring();
                }
            }
            Transition::Wait => {
                self.reset();
                self.transition(RoundState::Waiting);
            }
            Transition::NewGame => {
                self.roster.broadcast(&ServerEvent::ScoresReset);
                self.start_round();
            }
        }
    }

    fn start_round(&mut self) {
        let phrase = self.phrases.next_phrase();
        let round = Round::new(&mut self.roster, &self.params, phrase, Instant::now());
        self.transition(RoundState::Round(round));
    }

    fn start_scoring(&mut self) {
        let standings = self.scores.ranked();
        self.reset();
        let end = Instant::now() + self.params.score_time;
        self.transition(RoundState::Scoring(Scoring::new(standings, end)));
    }

    /// Shuffles the roster and starts a fresh game cycle.
    fn reset(&mut self) {
        self.roster.shuffle();
        self.scores.reset();
        self.round_number = 1;
    }

    fn transition(&mut self, state: RoundState) {
        self.state = state;
        tracing::info!(
            room = %self.name,
            phase = %self.phase(),
            round = self.round_number,
            "state changed"
        );

        let now = Instant::now();
        for member in self.roster.iter() {
            for event in self.state_events(member.id, now) {
                member.send(event);
            }
        }
    }
}
