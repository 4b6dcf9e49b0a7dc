//! The round state: a phrase, its artists, and everyone guessing it.

use std::iter;

use scrawl_protocol::{ChatEntry, ChatKind, ParticipantId, RoundView, ServerEvent, StateUpdate, StateView, StrokeData};
use tokio::time::Instant;

use super::{Ctx, Transition, notify_status, signed_secs, status_view};
use crate::RoomParams;
use crate::hint::create_hint;
use crate::roster::{Roster, Seat};
use crate::stroke::StrokeLog;

/// Hints each round starts with.
pub const TOTAL_HINTS: u32 = 2;

/// Artist bonus for the first correct guess.
const FIRST_GUESS_ARTIST_POINTS: i64 = 10;
/// Artist bonus for each later guess, while fewer than
/// [`ARTIST_BONUS_GUESSER_LIMIT`] have guessed.
const LATER_GUESS_ARTIST_POINTS: i64 = 1;
const ARTIST_BONUS_GUESSER_LIMIT: usize = 6;
/// The first guesser scores this much, each later one a point less...
const MAX_GUESSER_POINTS: i64 = 10;
/// ...down to this floor.
const MIN_GUESSER_POINTS: i64 = 5;
/// What each hint costs every artist.
const HINT_COST: i64 = 2;

/// A near miss needs a common prefix at least this long...
const CLOSE_GUESS_MIN_PREFIX: usize = 5;
/// ...and covering at least this share of the phrase.
const CLOSE_GUESS_MIN_SHARE: f64 = 0.3;

pub(super) struct Round {
    phrase: String,
    artists: Vec<Seat>,
    /// In the order they guessed.
    guessers: Vec<Seat>,
    start: Instant,
    end: Instant,
    rush_phase: bool,
    started_drawing: bool,
    hints_remaining: u32,
    current_hint: Option<String>,
    can_skip: bool,
    strokes: StrokeLog,
}

impl Round {
    /// Starts a round, taking the next artists off the front of `roster`.
    pub fn new(roster: &mut Roster, params: &RoomParams, phrase: String, now: Instant) -> Self {
        let artists = roster.select_artists(params.artist_count);
        Self {
            phrase,
            artists,
            guessers: Vec::new(),
            start: now,
            end: now + params.round_time,
            rush_phase: false,
            started_drawing: false,
            hints_remaining: TOTAL_HINTS,
            current_hint: None,
            can_skip: true,
            strokes: StrokeLog::new(),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn artists(&self) -> &[Seat] {
        &self.artists
    }

    pub fn current_hint(&self) -> Option<&str> {
        self.current_hint.as_deref()
    }

    pub fn hints_remaining(&self) -> u32 {
        self.hints_remaining
    }

    pub fn can_skip(&self) -> bool {
        self.can_skip
    }

    pub fn in_rush_phase(&self) -> bool {
        self.rush_phase
    }

    pub fn replay(&self) -> Vec<u8> {
        self.strokes.replay()
    }

    pub fn is_artist(&self, id: ParticipantId) -> bool {
        self.artists.iter().any(|s| s.id == id)
    }

    pub fn has_guessed(&self, id: ParticipantId) -> bool {
        self.guessers.iter().any(|s| s.id == id)
    }

    /// The round as `id` sees it. Only artists get the phrase.
    pub fn view(&self, id: ParticipantId, round_number: u32, now: Instant) -> StateView {
        let is_artist = self.is_artist(id);
        let view = RoundView {
            round: round_number,
            artists: self.artists.iter().map(|s| s.name.clone()).collect(),
            elapsed_time: signed_secs(now, self.start),
            remaining_time: signed_secs(self.end, now),
            rush_phase: self.rush_phase,
            guessers: self.guessers.iter().map(|s| s.name.clone()).collect(),
            hint: self.current_hint.clone(),
            can_skip: self.can_skip,
            hints_remaining: self.hints_remaining,
            phrase: is_artist.then(|| self.phrase.clone()),
        };
        if is_artist {
            StateView::Draw(view)
        } else {
            StateView::Guess(view)
        }
    }

    /// Every member is either drawing or has guessed.
    fn everyone_guessed(&self, roster: &Roster) -> bool {
        roster
            .iter()
            .all(|m| self.is_artist(m.id) || self.has_guessed(m.id))
    }

    fn has_remaining_time(&self, params: &RoomParams, now: Instant) -> bool {
        now < self.end + params.time_fudge
    }

    fn artist_names(&self) -> String {
        join_names(&self.artists)
    }

    // -- actions ------------------------------------------------------------

    pub fn part(&mut self, id: ParticipantId) {
        self.artists.retain(|s| s.id != id);
    }

    /// Any stroke received, even one that is then ignored, stops the
    /// draw-inactivity timer.
    pub fn draw(&mut self, ctx: &Ctx<'_>, id: ParticipantId, stroke: &[u8]) {
        self.started_drawing = true;
        if !self.is_artist(id) {
            tracing::trace!(room = ctx.room, participant = %id, "stroke from non-artist ignored");
            return;
        }
        match self.strokes.draw(id, stroke) {
            Ok(enveloped) => {
                ctx.roster
                    .broadcast_except(id, &ServerEvent::Draw(StrokeData(enveloped)));
            }
            Err(e) => {
                tracing::warn!(room = ctx.room, participant = %id, error = %e, "dropping malformed stroke");
            }
        }
    }

    /// Returns `None` if the message is plain chat after all.
    pub fn say(
        &mut self,
        ctx: &mut Ctx<'_>,
        id: ParticipantId,
        message: &str,
        now: Instant,
    ) -> Option<Transition> {
        if self.is_artist(id) {
            return None;
        }
        let seat = ctx.roster.get(id)?.seat();

        let guess = message.trim();
        let phrase = self.phrase.trim().to_lowercase();
        let lowered = guess.to_lowercase();

        if lowered.contains(&phrase) {
            if now > self.end + ctx.params.time_fudge {
                tracing::debug!(room = ctx.room, participant = %id, "late guess treated as chat");
                return None;
            }
            return Some(self.add_guesser(ctx, seat, now));
        }

        let prefix = phrase
            .chars()
            .zip(lowered.chars())
            .take_while(|(a, b)| a == b)
            .count();
        let share = prefix as f64 / phrase.chars().count() as f64;
        if prefix >= CLOSE_GUESS_MIN_PREFIX && share >= CLOSE_GUESS_MIN_SHARE {
            ctx.roster.send_to(
                id,
                ServerEvent::Chat(ChatEntry::system(
                    ChatKind::CloseGuess,
                    format!("**{guess}** is close!"),
                )),
            );
            let relay = ServerEvent::Chat(ChatEntry::authored(ChatKind::Chat, message, seat.name));
            for artist in &self.artists {
                ctx.roster.send_to(artist.id, relay.clone());
            }
            return Some(Transition::Stay);
        }

        None
    }

    /// Scores a correct guess. Guessing twice in a round does nothing.
    fn add_guesser(&mut self, ctx: &mut Ctx<'_>, seat: Seat, now: Instant) -> Transition {
        if self.has_guessed(seat.id) {
            return Transition::Stay;
        }

        let before = self.guessers.len();
        let artist_points = match before {
            0 => FIRST_GUESS_ARTIST_POINTS,
            n if n < ARTIST_BONUS_GUESSER_LIMIT => LATER_GUESS_ARTIST_POINTS,
            _ => 0,
        };
        for artist in &self.artists {
            ctx.scores.add(&artist.name, artist_points);
        }
        let points = (MAX_GUESSER_POINTS - before as i64).max(MIN_GUESSER_POINTS);
        ctx.scores.add(&seat.name, points);

        tracing::debug!(room = ctx.room, participant = %seat.id, points, "correct guess");
        self.guessers.push(seat.clone());

        ctx.roster.broadcast(&ServerEvent::GuessCorrect);
        ctx.roster.send_to(
            seat.id,
            ServerEvent::Chat(ChatEntry::system(
                ChatKind::Correct,
                format!("You guessed the word **{}**.", self.phrase),
            )),
        );
        let notice = ServerEvent::Chat(ChatEntry::system(
            ChatKind::GuessedYourWord,
            format!("**{}** guessed your word, *{}*.", seat.name, self.phrase),
        ));
        for artist in &self.artists {
            ctx.roster.send_to(artist.id, notice.clone());
        }

        let changed = iter::once(seat.id).chain(self.artists.iter().map(|s| s.id));
        self.broadcast_scores(ctx, changed);

        if self.can_skip || self.hints_remaining > 0 {
            self.can_skip = false;
            self.hints_remaining = 0;
            let update = ServerEvent::StateUpdate(StateUpdate {
                can_skip: Some(false),
                hints_remaining: Some(0),
                ..StateUpdate::default()
            });
            for artist in &self.artists {
                ctx.roster.send_to(artist.id, update.clone());
            }
        }

        if self.everyone_guessed(ctx.roster) {
            self.finish(ctx)
        } else {
            if !self.rush_phase {
                self.start_rush_phase(ctx, now);
            }
            Transition::Stay
        }
    }

    fn start_rush_phase(&mut self, ctx: &mut Ctx<'_>, now: Instant) {
        self.rush_phase = true;
        self.start = now;
        self.end = now + ctx.params.rush_phase_time;
        tracing::debug!(room = ctx.room, "rush phase started");

        ctx.roster.broadcast(&ServerEvent::StateUpdate(StateUpdate {
            rush_phase: Some(true),
            elapsed_time: Some(0.0),
            remaining_time: Some(ctx.params.rush_phase_time.as_secs_f64()),
            ..StateUpdate::default()
        }));
    }

    pub fn skip(&mut self, ctx: &mut Ctx<'_>, id: ParticipantId) -> Transition {
        if !self.is_artist(id) || !self.can_skip {
            return Transition::Stay;
        }
        tracing::debug!(room = ctx.room, participant = %id, "round skipped");
        ctx.announce(ChatEntry::system(
            ChatKind::RoundEnd,
            format!("Round skipped by **{}**!", self.artist_names()),
        ));
        Transition::Advance
    }

    pub fn hint(&mut self, ctx: &mut Ctx<'_>, id: ParticipantId) {
        if !self.is_artist(id) || self.hints_remaining == 0 {
            return;
        }
        let reveal = (TOTAL_HINTS - self.hints_remaining + 1) as usize;
        let hint = create_hint(&self.phrase, reveal);
        self.hints_remaining -= 1;
        self.current_hint = Some(hint.clone());

        ctx.roster.broadcast(&ServerEvent::StateUpdate(StateUpdate {
            hint: Some(hint.clone()),
            ..StateUpdate::default()
        }));
        ctx.announce(ChatEntry::system(ChatKind::Hint, format!("Hint: **{hint}**")));

        let remaining = ServerEvent::StateUpdate(StateUpdate {
            hints_remaining: Some(self.hints_remaining),
            ..StateUpdate::default()
        });
        for artist in &self.artists {
            ctx.roster.send_to(artist.id, remaining.clone());
            ctx.scores.add(&artist.name, -HINT_COST);
        }
        self.broadcast_scores(ctx, self.artists.iter().map(|s| s.id));
    }

    /// Checked once per tick, first match wins.
    pub fn think(&mut self, ctx: &mut Ctx<'_>, now: Instant) -> Transition {
        if !ctx.has_enough_players() {
            tracing::info!(room = ctx.room, "not enough players, back to waiting");
            return Transition::Wait;
        }
        if self.artists.is_empty()
            || !self.has_remaining_time(ctx.params, now)
            || self.everyone_guessed(ctx.roster)
        {
            return self.finish(ctx);
        }
        if !self.started_drawing
            && now.saturating_duration_since(self.start) > ctx.params.draw_inactivity_time
        {
            tracing::info!(room = ctx.room, artists = %self.artist_names(), "artists idle, marking away");
            for artist in &self.artists {
                if let Some(member) = ctx.roster.get_mut(artist.id) {
                    member.away = true;
                }
                notify_status(ctx.roster, ctx.scores, Some(&*self), artist.id);
            }
            return self.finish(ctx);
        }
        Transition::Stay
    }

    /// Announces how the round went and moves on.
    fn finish(&self, ctx: &mut Ctx<'_>) -> Transition {
        let drawn_by = if self.artists.is_empty() {
            String::new()
        } else {
            format!(" drawn by *{}*", self.artist_names())
        };

        let summary = if self.guessers.is_empty() {
            format!("Nobody guessed the word **{}**{drawn_by}!", self.phrase)
        } else if self.everyone_guessed(ctx.roster) {
            format!("Everyone guessed the word **{}**{drawn_by}!", self.phrase)
        } else {
            format!(
                "**{}** guessed the word **{}**{drawn_by}!",
                join_names(&self.guessers),
                self.phrase
            )
        };
        ctx.announce(ChatEntry::system(ChatKind::RoundEnd, summary));
        Transition::Advance
    }

    /// Sends everyone the current score of each listed participant.
    fn broadcast_scores(&self, ctx: &Ctx<'_>, ids: impl Iterator<Item = ParticipantId>) {
        let scores = ids
            .filter_map(|id| ctx.roster.get(id))
            .map(|m| status_view(m, ctx.scores, Some(self)))
            .collect();
        ctx.roster.broadcast(&ServerEvent::Scores { scores });
    }
}

fn join_names(seats: &[Seat]) -> String {
    seats
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
