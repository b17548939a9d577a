//! Match, its competitor slots and set scores.

use crate::models::participant::ParticipantId;
use crate::models::round::Round;
use crate::models::tournament::{CategoryId, TournamentId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Which side of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    #[default]
    Team1,
    Team2,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::Team1 => Slot::Team2,
            Slot::Team2 => Slot::Team1,
        }
    }

    /// Slot a winner of the match at `position` takes in the next round.
    pub fn for_position(position: u32) -> Slot {
        if position % 2 == 0 {
            Slot::Team1
        } else {
            Slot::Team2
        }
    }
}

/// What occupies one side of a match: a registered team, or two individual players.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Competitor {
    Team { id: ParticipantId },
    Pair { first: ParticipantId, second: ParticipantId },
}

impl Competitor {
    pub fn team(id: ParticipantId) -> Self {
        Competitor::Team { id }
    }

    pub fn pair(first: ParticipantId, second: ParticipantId) -> Self {
        Competitor::Pair { first, second }
    }

    /// Participants represented by this competitor.
    pub fn participants(&self) -> Vec<ParticipantId> {
        match *self {
            Competitor::Team { id } => vec![id],
            Competitor::Pair { first, second } => vec![first, second],
        }
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants().contains(&id)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Games won by each side in one set.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SetScore {
    pub team1: u32,
    pub team2: u32,
}

impl SetScore {
    pub fn new(team1: u32, team2: u32) -> Self {
        Self { team1, team2 }
    }
}

/// Most sets a match can carry.
pub const MAX_SETS: usize = 3;

/// Side with more games across all sets, or None on a tie (including no sets).
pub fn decide_winner(sets: &[SetScore]) -> Option<Slot> {
    let (g1, g2) = games_per_side(sets);
    match g1.cmp(&g2) {
        std::cmp::Ordering::Greater => Some(Slot::Team1),
        std::cmp::Ordering::Less => Some(Slot::Team2),
        std::cmp::Ordering::Equal => None,
    }
}

/// Total games won by (team1, team2).
pub fn games_per_side(sets: &[SetScore]) -> (u32, u32) {
    sets.iter()
        .fold((0u32, 0u32), |(a, b), s| {
            (a.saturating_add(s.team1), b.saturating_add(s.team2))
        })
}

/// A single match of a tournament category.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub category_id: CategoryId,
    pub round: Round,
    /// Zero-based order inside the round; drives next-round slot selection.
    pub position: u32,
    /// None while the slot is still to be decided ("TBD").
    pub team1: Option<Competitor>,
    pub team2: Option<Competitor>,
    pub sets: Vec<SetScore>,
    pub status: MatchStatus,
    /// Cached winner, kept in sync with `sets` whenever the match is completed.
    pub winner: Option<Slot>,
    pub court: Option<u32>,
    pub scheduled_at: Option<NaiveDateTime>,
}

impl Match {
    pub fn new(
        tournament_id: TournamentId,
        category_id: CategoryId,
        round: Round,
        position: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            category_id,
            round,
            position,
            team1: None,
            team2: None,
            sets: Vec::new(),
            status: MatchStatus::Scheduled,
            winner: None,
            court: None,
            scheduled_at: None,
        }
    }

    /// Builder-style slot assignment.
    pub fn with_sides(mut self, team1: Option<Competitor>, team2: Option<Competitor>) -> Self {
        self.team1 = team1;
        self.team2 = team2;
        self
    }

    pub fn side(&self, slot: Slot) -> Option<Competitor> {
        match slot {
            Slot::Team1 => self.team1,
            Slot::Team2 => self.team2,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Winning side, derived from the scores of a completed match.
    pub fn winning_slot(&self) -> Option<Slot> {
        if !self.is_completed() {
            return None;
        }
        decide_winner(&self.sets)
    }

    /// Completed with a decisive score and both sides known.
    pub fn is_decided(&self) -> bool {
        self.winning_slot().is_some() && self.team1.is_some() && self.team2.is_some()
    }

    pub fn winner_competitor(&self) -> Option<Competitor> {
        self.winning_slot().and_then(|s| self.side(s))
    }

    pub fn loser_competitor(&self) -> Option<Competitor> {
        self.winning_slot().and_then(|s| self.side(s.other()))
    }

    /// Slot currently holding `competitor`, if any.
    pub fn slot_of(&self, competitor: Competitor) -> Option<Slot> {
        if self.team1 == Some(competitor) {
            Some(Slot::Team1)
        } else if self.team2 == Some(competitor) {
            Some(Slot::Team2)
        } else {
            None
        }
    }

    pub fn first_empty_slot(&self) -> Option<Slot> {
        if self.team1.is_none() {
            Some(Slot::Team1)
        } else if self.team2.is_none() {
            Some(Slot::Team2)
        } else {
            None
        }
    }

    pub fn participants(&self) -> Vec<ParticipantId> {
        self.team1
            .iter()
            .chain(self.team2.iter())
            .flat_map(|c| c.participants())
            .collect()
    }

    /// Side the participant plays on.
    pub fn side_of(&self, id: ParticipantId) -> Option<Slot> {
        if self.team1.is_some_and(|c| c.contains(id)) {
            Some(Slot::Team1)
        } else if self.team2.is_some_and(|c| c.contains(id)) {
            Some(Slot::Team2)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(sets: Vec<SetScore>) -> Match {
        let mut m = Match::new(Uuid::new_v4(), Uuid::new_v4(), Round::Final, 0).with_sides(
            Some(Competitor::team(Uuid::new_v4())),
            Some(Competitor::team(Uuid::new_v4())),
        );
        m.sets = sets;
        m.status = MatchStatus::Completed;
        m
    }

    #[test]
    fn huge_set_scores_saturate() {
        let sets = [SetScore::new(u32::MAX, 0), SetScore::new(6, 1)];
        assert_eq!(games_per_side(&sets), (u32::MAX, 1));
        assert_eq!(decide_winner(&sets), Some(Slot::Team1));
    }

    #[test]
    fn winner_is_decided_on_total_games() {
        let m = completed(vec![SetScore::new(6, 0), SetScore::new(0, 6), SetScore::new(7, 6)]);
        assert_eq!(m.winning_slot(), Some(Slot::Team1));
        // Loses the set count 1-2 but wins on games, 16 to 13.
        let m = completed(vec![SetScore::new(6, 7), SetScore::new(6, 0), SetScore::new(4, 6)]);
        assert_eq!(m.winning_slot(), Some(Slot::Team1));
    }

    #[test]
    fn tied_games_leave_no_winner() {
        let m = completed(vec![SetScore::new(6, 4), SetScore::new(4, 6)]);
        assert_eq!(m.winning_slot(), None);
        assert!(!m.is_decided());
    }

    #[test]
    fn unfinished_match_has_no_winner() {
        let mut m = completed(vec![SetScore::new(6, 0)]);
        m.status = MatchStatus::InProgress;
        assert_eq!(m.winner_competitor(), None);
    }

    #[test]
    fn next_round_slot_follows_position_parity() {
        assert_eq!(Slot::for_position(0), Slot::Team1);
        assert_eq!(Slot::for_position(3), Slot::Team2);
    }
}
