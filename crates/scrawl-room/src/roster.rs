//! The ordered roster of a room, and broadcast fan-out.
//!
//! Roster order matters: the front of the queue is who draws next.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use scrawl_protocol::{ParticipantId, ServerEvent};
use scrawl_session::EventSender;

/// A participant as seen from inside a room.
#[derive(Debug, Clone)]
pub(crate) struct Member {
    pub id: ParticipantId,
    pub name: String,
    pub away: bool,
    sender: EventSender,
}

impl Member {
    pub fn new(id: ParticipantId, name: String, away: bool, sender: EventSender) -> Self {
        Self {
            id,
            name,
            away,
            sender,
        }
    }

    /// Best-effort delivery; a closed channel never affects the room.
    pub fn send(&self, event: ServerEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!(participant = %self.id, "outbound channel closed, event dropped");
        }
    }

    pub fn seat(&self) -> Seat {
        Seat {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Who someone is, kept after they leave the roster (for round summaries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Seat {
    pub id: ParticipantId,
    pub name: String,
}

#[derive(Debug, Default)]
pub(crate) struct Roster {
    members: VecDeque<Member>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    pub fn push(&mut self, member: Member) {
        self.members.push_back(member);
    }

    pub fn remove(&mut self, id: ParticipantId) -> Option<Member> {
        let position = self.members.iter().position(|m| m.id == id)?;
        self.members.remove(position)
    }

    /// Members who are not away.
    pub fn active_count(&self) -> usize {
        self.members.iter().filter(|m| !m.away).count()
    }

    pub fn shuffle(&mut self) {
        self.members.make_contiguous().shuffle(&mut rand::rng());
    }

    /// Takes up to `count` active members off the front of the queue as
    /// artists.
    ///
    /// Away members met on the way are set aside. Selection stops once one
    /// or fewer members would be left unassigned, so a guesser always
    /// remains. Set-aside members and then the artists go to the back of
    /// the queue, which rotates drawing duty round-robin.
    pub fn select_artists(&mut self, count: usize) -> Vec<Seat> {
        let mut artists = Vec::new();
        let mut skipped = Vec::new();

        while self.members.len() + skipped.len() > 1 && artists.len() < count {
            let Some(member) = self.members.pop_front() else {
                break;
            };
            if member.away {
                skipped.push(member);
            } else {
                artists.push(member);
            }
        }

        let seats = artists.iter().map(Member::seat).collect();
        self.members.extend(skipped);
        self.members.extend(artists);
        seats
    }

    pub fn broadcast(&self, event: &ServerEvent) {
        for member in &self.members {
            member.send(event.clone());
        }
    }

    pub fn broadcast_except(&self, excluded: ParticipantId, event: &ServerEvent) {
        for member in self.members.iter().filter(|m| m.id != excluded) {
            member.send(event.clone());
        }
    }

    pub fn send_to(&self, id: ParticipantId, event: ServerEvent) {
        if let Some(member) = self.get(id) {
            member.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn member(id: u64, away: bool) -> Member {
        Member::new(
            ParticipantId(id),
            format!("p{id}"),
            away,
            mpsc::unbounded_channel().0,
        )
    }

    fn roster(spec: &[(u64, bool)]) -> Roster {
        let mut roster = Roster::default();
        for &(id, away) in spec {
            roster.push(member(id, away));
        }
        roster
    }

    fn order(roster: &Roster) -> Vec<u64> {
        roster.iter().map(|m| m.id.0).collect()
    }

    #[test]
    fn test_select_rotates_artist_to_back() {
        let mut r = roster(&[(1, false), (2, false), (3, false)]);

        let artists = r.select_artists(1);

        assert_eq!(artists.iter().map(|s| s.id.0).collect::<Vec<_>>(), [1]);
        assert_eq!(order(&r), [2, 3, 1]);
    }

    #[test]
    fn test_select_skips_away_members() {
        let mut r = roster(&[(1, true), (2, false), (3, false)]);

        let artists = r.select_artists(1);

        assert_eq!(artists[0].id, ParticipantId(2));
        assert_eq!(order(&r), [3, 1, 2]);
    }

    #[test]
    fn test_select_always_leaves_a_guesser() {
        let mut r = roster(&[(1, false), (2, false)]);

        let artists = r.select_artists(5);

        assert_eq!(artists.len(), 1);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_select_with_everyone_away_picks_nobody() {
        let mut r = roster(&[(1, true), (2, true), (3, true)]);

        let artists = r.select_artists(1);

        assert!(artists.is_empty());
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_active_count_and_remove() {
        let mut r = roster(&[(1, true), (2, false), (3, false)]);
        assert_eq!(r.active_count(), 2);

        let gone = r.remove(ParticipantId(2)).unwrap();
        assert_eq!(gone.name, "p2");
        assert_eq!(r.active_count(), 1);
        assert!(!r.contains(ParticipantId(2)));
    }

    #[test]
    fn test_broadcast_except_skips_sender() {
        let mut r = Roster::default();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        r.push(Member::new(ParticipantId(1), "ann".into(), false, tx1));
        r.push(Member::new(ParticipantId(2), "bob".into(), false, tx2));

        r.broadcast_except(ParticipantId(1), &ServerEvent::GuessCorrect);

        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), ServerEvent::GuessCorrect);
    }
}
