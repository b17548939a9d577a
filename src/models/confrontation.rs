//! Super-teams bracket node: two doubles games plus an optional decisive tiebreak.

use crate::models::game::{MatchStatus, Slot};
use crate::models::participant::ParticipantId;
use crate::models::round::Round;
use crate::models::tournament::{CategoryId, TournamentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ConfrontationId = Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Doubles1,
    Doubles2,
    DecisiveTiebreak,
}

/// Score of one game inside a confrontation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConfrontationGame {
    pub kind: GameKind,
    pub team1: u32,
    pub team2: u32,
}

impl ConfrontationGame {
    pub fn new(kind: GameKind, team1: u32, team2: u32) -> Self {
        Self { kind, team1, team2 }
    }

    fn winner(&self) -> Option<Slot> {
        match self.team1.cmp(&self.team2) {
            std::cmp::Ordering::Greater => Some(Slot::Team1),
            std::cmp::Ordering::Less => Some(Slot::Team2),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Confrontation {
    pub id: ConfrontationId,
    pub tournament_id: TournamentId,
    pub category_id: CategoryId,
    pub round: Round,
    pub position: u32,
    pub team1: Option<ParticipantId>,
    pub team2: Option<ParticipantId>,
    pub games: Vec<ConfrontationGame>,
    pub status: MatchStatus,
    pub winner: Option<Slot>,
}

impl Confrontation {
    pub fn new(tournament_id: TournamentId, category_id: CategoryId, round: Round, position: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            category_id,
            round,
            position,
            team1: None,
            team2: None,
            games: Vec::new(),
            status: MatchStatus::Scheduled,
            winner: None,
        }
    }

    pub fn with_teams(mut self, team1: Option<ParticipantId>, team2: Option<ParticipantId>) -> Self {
        self.team1 = team1;
        self.team2 = team2;
        self
    }

    pub fn side(&self, slot: Slot) -> Option<ParticipantId> {
        match slot {
            Slot::Team1 => self.team1,
            Slot::Team2 => self.team2,
        }
    }

    /// Winner of a completed confrontation: 2-0 on the doubles games, or the
    /// decisive tiebreak when they are split.
    pub fn winning_slot(&self) -> Option<Slot> {
        if self.status != MatchStatus::Completed {
            return None;
        }
        let doubles: Vec<Slot> = self
            .games
            .iter()
            .filter(|g| g.kind != GameKind::DecisiveTiebreak)
            .filter_map(ConfrontationGame::winner)
            .collect();
        let team1_games = doubles.iter().filter(|s| **s == Slot::Team1).count();
        let team2_games = doubles.len() - team1_games;
        match (team1_games, team2_games) {
            (2, 0) => Some(Slot::Team1),
            (0, 2) => Some(Slot::Team2),
            (1, 1) => self
                .games
                .iter()
                .find(|g| g.kind == GameKind::DecisiveTiebreak)
                .and_then(ConfrontationGame::winner),
            _ => None,
        }
    }

    pub fn winner_team(&self) -> Option<ParticipantId> {
        self.winning_slot().and_then(|s| self.side(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(games: Vec<ConfrontationGame>) -> Confrontation {
        let mut c = Confrontation::new(Uuid::new_v4(), Uuid::new_v4(), Round::Final, 0)
            .with_teams(Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        c.games = games;
        c.status = MatchStatus::Completed;
        c
    }

    #[test]
    fn two_doubles_wins_decide() {
        let c = played(vec![
            ConfrontationGame::new(GameKind::Doubles1, 6, 3),
            ConfrontationGame::new(GameKind::Doubles2, 7, 5),
        ]);
        assert_eq!(c.winning_slot(), Some(Slot::Team1));
    }

    #[test]
    fn split_games_need_the_tiebreak() {
        let mut c = played(vec![
            ConfrontationGame::new(GameKind::Doubles1, 6, 3),
            ConfrontationGame::new(GameKind::Doubles2, 2, 6),
        ]);
        assert_eq!(c.winning_slot(), None);
        c.games.push(ConfrontationGame::new(GameKind::DecisiveTiebreak, 8, 10));
        assert_eq!(c.winning_slot(), Some(Slot::Team2));
        assert_eq!(c.winner_team(), c.team2);
    }
}
